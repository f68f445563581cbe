//! Labeled CSV loading
//!
//! Reads the applicant table, drops a leading index column if present and
//! renames the label column to `TARGET`.

use super::frame::{Frame, LabeledFrame};
use crate::error::{Result, ScoringError};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Label column name in the source CSV
pub const RAW_LABEL_COLUMN: &str = "SeriousDlqin2yrs";

/// Internal label column name
pub const TARGET_COLUMN: &str = "TARGET";

/// Header pandas gives an unnamed leading index column
pub const INDEX_COLUMN: &str = "Unnamed: 0";

/// Load a labeled training table from a CSV file
pub fn load_training_csv<P: AsRef<Path>>(path: P) -> Result<LabeledFrame> {
    let path = path.as_ref();
    info!("Loading data: {}", path.display());
    let file = File::open(path)
        .map_err(|e| ScoringError::InvalidData(format!("cannot open {}: {}", path.display(), e)))?;
    let data = read_training_csv(file)?;
    info!(
        "Loaded {} rows, {} feature columns, {} positives",
        data.n_samples(),
        data.features.n_cols(),
        data.n_positive()
    );
    Ok(data)
}

/// Parse a labeled training table from any reader
pub fn read_training_csv<R: Read>(reader: R) -> Result<LabeledFrame> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        for (col_idx, cell) in record.iter().enumerate() {
            let value = parse_cell(cell).ok_or_else(|| {
                ScoringError::InvalidData(format!(
                    "row {}: column '{}' has non-numeric or non-finite value '{}'",
                    row_idx + 1,
                    headers[col_idx],
                    cell
                ))
            })?;
            columns[col_idx].push(value);
        }
    }

    let mut frame = Frame::from_columns(headers.iter().cloned().zip(columns))?;

    if let Some(first) = headers.first() {
        if first == INDEX_COLUMN || first.is_empty() {
            debug!("Dropping index column '{}'", first);
            frame.drop_column(first);
        }
    }

    frame.rename_column(RAW_LABEL_COLUMN, TARGET_COLUMN);
    let raw_labels = frame.drop_column(TARGET_COLUMN).ok_or_else(|| {
        ScoringError::InvalidData(format!(
            "missing label column '{}' (or '{}')",
            RAW_LABEL_COLUMN, TARGET_COLUMN
        ))
    })?;

    let labels = raw_labels
        .iter()
        .enumerate()
        .map(|(i, &y)| match y {
            y if y == 0.0 => Ok(0.0),
            y if y == 1.0 => Ok(1.0),
            _ => Err(ScoringError::InvalidData(format!(
                "row {}: label must be 0 or 1, got {}",
                i + 1,
                y
            ))),
        })
        .collect::<Result<Vec<f64>>>()?;

    LabeledFrame::new(frame, labels)
}

/// Parse one CSV cell; empty and NA-like cells become NaN
///
/// Infinite values (`inf`, or literals overflowing f64) are rejected.
fn parse_cell(cell: &str) -> Option<f64> {
    match cell {
        "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "NULL" => Some(f64::NAN),
        other => other.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

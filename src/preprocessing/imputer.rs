//! Median imputation

use crate::error::{Result, ScoringError};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};
use tracing::warn;

/// Replaces NaN cells with the training median of their column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: Vec<f64>,
}

impl MedianImputer {
    /// Learn per-column medians, ignoring NaN cells
    ///
    /// A column with no observed values imputes to 0.0.
    pub fn fit(x: ArrayView2<f64>) -> Self {
        let medians = x
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(j, column)| {
                let observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
                median(observed).unwrap_or_else(|| {
                    warn!("Column {} has no observed values, imputing 0.0", j);
                    0.0
                })
            })
            .collect();

        Self { medians }
    }

    pub fn medians(&self) -> &[f64] {
        &self.medians
    }

    pub fn n_features(&self) -> usize {
        self.medians.len()
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.medians.len() {
            return Err(ScoringError::InvalidData(format!(
                "imputer fitted on {} features, got {}",
                self.medians.len(),
                x.ncols()
            )));
        }

        let mut out = x.to_owned();
        for (mut column, &fill) in out.axis_iter_mut(Axis(1)).zip(&self.medians) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(out)
    }
}

fn median(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Data::new(values).median())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_median_ignores_nan() {
        let x = array![[1.0, f64::NAN], [f64::NAN, 4.0], [3.0, 2.0], [10.0, f64::NAN]];
        let imputer = MedianImputer::fit(x.view());
        assert_eq!(imputer.medians(), &[3.0, 3.0]);

        let out = imputer.transform(x.view()).unwrap();
        assert_eq!(out[[1, 0]], 3.0);
        assert_eq!(out[[0, 1]], 3.0);
        assert_eq!(out[[2, 1]], 2.0);
    }

    #[test]
    fn test_even_count_median_averages_middle_pair() {
        let x = array![[4.0], [1.0], [f64::NAN], [3.0], [2.0]];
        let imputer = MedianImputer::fit(x.view());
        assert_eq!(imputer.medians(), &[2.5]);
    }

    #[test]
    fn test_all_missing_column_imputes_zero() {
        let x = array![[f64::NAN], [f64::NAN]];
        let imputer = MedianImputer::fit(x.view());
        assert_eq!(imputer.medians(), &[0.0]);
    }

    #[test]
    fn test_width_mismatch_is_error() {
        let imputer = MedianImputer::fit(array![[1.0, 2.0]].view());
        assert!(imputer.transform(array![[1.0]].view()).is_err());
    }
}

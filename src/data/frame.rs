//! Column-oriented numeric table with NaN as the null marker

use crate::error::{Result, ScoringError};
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Ordered set of named numeric columns
///
/// Missing values are stored as `f64::NAN`. Column order is significant: it
/// is the order features are handed to the preprocessor and the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Frame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, values)` pairs, keeping their order
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut frame = Self::new();
        for (name, values) in columns {
            let name = name.into();
            if frame.has_column(&name) {
                return Err(ScoringError::InvalidData(format!("duplicate column '{}'", name)));
            }
            frame.set_column(name, values)?;
        }
        Ok(frame)
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// Column names in order
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Borrow a column by name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }

    /// Mutably borrow a column by name
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        self.position(name).map(move |i| &mut self.columns[i])
    }

    /// Replace a column in place, or append it at the end if it is new
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if !self.names.is_empty() && values.len() != self.n_rows() {
            return Err(ScoringError::InvalidData(format!(
                "column '{}' has {} rows, frame has {}",
                name,
                values.len(),
                self.n_rows()
            )));
        }

        match self.position(&name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Remove a column, returning its values
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let i = self.position(name)?;
        self.names.remove(i);
        Some(self.columns.remove(i))
    }

    /// Rename a column, keeping its position
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.position(from) {
            Some(i) => {
                self.names[i] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Values of a single row, in column order
    pub fn row(&self, index: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[index]).collect()
    }

    /// Create a new frame holding only the given rows
    pub fn select_rows(&self, indices: &[usize]) -> Frame {
        Frame {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| indices.iter().map(|&i| c[i]).collect())
                .collect(),
        }
    }

    /// Row-major feature matrix (n_rows x n_cols)
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.n_rows(), self.n_cols()), |(i, j)| self.columns[j][i])
    }
}

/// Feature frame paired with binary labels
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFrame {
    pub features: Frame,
    /// Binary labels stored as 0.0 / 1.0
    pub labels: Vec<f64>,
}

/// Train/test split result
#[derive(Debug, Clone)]
pub struct Split {
    pub train: LabeledFrame,
    pub test: LabeledFrame,
}

impl LabeledFrame {
    pub fn new(features: Frame, labels: Vec<f64>) -> Result<Self> {
        if features.n_cols() > 0 && features.n_rows() != labels.len() {
            return Err(ScoringError::InvalidData(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.len()
            )));
        }
        Ok(Self { features, labels })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Number of positive labels
    pub fn n_positive(&self) -> usize {
        self.labels.iter().filter(|&&y| y > 0.5).count()
    }

    /// Create a subset by row indices
    pub fn subset(&self, indices: &[usize]) -> LabeledFrame {
        LabeledFrame {
            features: self.features.select_rows(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Shuffled split that keeps the class ratio in both parts
    ///
    /// Every class contributes `round(class_size * test_ratio)` rows to the
    /// test part. The result is fully determined by `seed`.
    pub fn stratified_split(&self, test_ratio: f64, seed: u64) -> Result<Split> {
        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            return Err(ScoringError::InvalidData(format!(
                "test ratio must be in (0, 1), got {}",
                test_ratio
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (mut negatives, mut positives): (Vec<usize>, Vec<usize>) =
            (0..self.n_samples()).partition(|&i| self.labels[i] <= 0.5);

        let mut train_idx = Vec::with_capacity(self.n_samples());
        let mut test_idx = Vec::new();

        for class in [&mut negatives, &mut positives] {
            class.shuffle(&mut rng);
            let n_test = (class.len() as f64 * test_ratio).round() as usize;
            let (test, train) = class.split_at(n_test.min(class.len()));
            test_idx.extend_from_slice(test);
            train_idx.extend_from_slice(train);
        }

        train_idx.shuffle(&mut rng);
        test_idx.shuffle(&mut rng);

        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(ScoringError::InvalidData(
                "not enough rows for a train/test split".to_string(),
            ));
        }

        Ok(Split {
            train: self.subset(&train_idx),
            test: self.subset(&test_idx),
        })
    }
}

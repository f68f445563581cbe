//! Imputer + scaler pipeline bound to a feature order

use super::{MedianImputer, StandardScaler};
use crate::data::Frame;
use crate::error::{Result, ScoringError};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fitted numeric preprocessing: median imputation, then standard scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    feature_names: Vec<String>,
    imputer: MedianImputer,
    scaler: StandardScaler,
}

impl Preprocessor {
    /// Fit on a training frame; the frame's column order becomes binding
    pub fn fit(frame: &Frame) -> Result<Self> {
        if frame.is_empty() {
            return Err(ScoringError::InvalidData("cannot fit preprocessor on an empty frame".to_string()));
        }

        let x = frame.to_array();
        let imputer = MedianImputer::fit(x.view());
        let imputed = imputer.transform(x.view())?;
        let scaler = StandardScaler::fit(imputed.view())?;

        let names = frame.column_names();
        let non_finite: Vec<&str> = (0..names.len())
            .filter(|&j| !(scaler.means()[j].is_finite() && scaler.scales()[j].is_finite()))
            .map(|j| names[j].as_str())
            .collect();
        if !non_finite.is_empty() {
            return Err(ScoringError::InvalidData(format!(
                "non-finite statistics for column(s): {}",
                non_finite.join(", ")
            )));
        }

        info!(
            "Fitted preprocessor on {} rows x {} features",
            frame.n_rows(),
            frame.n_cols()
        );

        Ok(Self {
            feature_names: frame.column_names().to_vec(),
            imputer,
            scaler,
        })
    }

    /// Feature names in fit-time order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn imputer(&self) -> &MedianImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Transform a matrix whose columns already follow the fit-time order
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let imputed = self.imputer.transform(x)?;
        self.scaler.transform(imputed.view())
    }

    /// Transform a frame after checking its columns match the fit-time order
    pub fn transform_frame(&self, frame: &Frame) -> Result<Array2<f64>> {
        if frame.column_names() != self.feature_names.as_slice() {
            return Err(ScoringError::SchemaMismatch(format!(
                "expected columns [{}], got [{}]",
                self.feature_names.join(", "),
                frame.column_names().join(", ")
            )));
        }
        self.transform(frame.to_array().view())
    }

    /// Internal consistency of the fitted state
    pub fn validate(&self) -> Result<()> {
        let n = self.feature_names.len();
        if self.imputer.n_features() != n || self.scaler.means().len() != n || self.scaler.scales().len() != n {
            return Err(ScoringError::SchemaMismatch(format!(
                "preprocessor state covers {} / {} / {} features but lists {} names",
                self.imputer.n_features(),
                self.scaler.means().len(),
                self.scaler.scales().len(),
                n
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frame() -> Frame {
        Frame::from_columns(vec![
            ("a", vec![1.0, f64::NAN, 3.0, 5.0]),
            ("b", vec![2.0, 2.0, 2.0, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_fit_transform() {
        let pre = Preprocessor::fit(&frame()).unwrap();
        assert_eq!(pre.imputer().medians(), &[3.0, 2.0]);

        let out = pre.transform_frame(&frame()).unwrap();
        // imputed column a = [1, 3, 3, 5], mean 3
        assert_abs_diff_eq!(out[[1, 0]], 0.0, epsilon = 1e-12);
        assert!(out.column(1).iter().all(|&v| v == 0.0));
        pre.validate().unwrap();
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let pre = Preprocessor::fit(&frame()).unwrap();
        let swapped = Frame::from_columns(vec![("b", vec![2.0]), ("a", vec![1.0])]).unwrap();
        assert!(matches!(
            pre.transform_frame(&swapped),
            Err(ScoringError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_fit_rejects_infinite_column() {
        let frame = Frame::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0]),
            ("DebtRatio", vec![0.5, f64::INFINITY, 0.1]),
        ])
        .unwrap();
        let err = Preprocessor::fit(&frame).unwrap_err();
        assert!(err.to_string().contains("DebtRatio"), "{}", err);
    }

    #[test]
    fn test_fit_rejects_overflowing_variance() {
        let frame = Frame::from_columns(vec![("x", vec![-1e300, 1e300])]).unwrap();
        assert!(Preprocessor::fit(&frame).is_err());
    }
}

//! Standard scaling (z-score)

use crate::error::{Result, ScoringError};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Centers each column on its training mean and divides by its standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and population standard deviations
    ///
    /// Constant columns get a scale of 1.0 so they map to zero.
    pub fn fit(x: ArrayView2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(ScoringError::InvalidData("cannot fit scaler on zero rows".to_string()));
        }

        let n = x.nrows() as f64;
        let mut means = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());

        for column in x.axis_iter(Axis(1)) {
            let mean = column.sum() / n;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            means.push(mean);
            scales.push(if std > 1e-12 { std } else { 1.0 });
        }

        Ok(Self { means, scales })
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.means.len() {
            return Err(ScoringError::InvalidData(format!(
                "scaler fitted on {} features, got {}",
                self.means.len(),
                x.ncols()
            )));
        }

        let mut out = x.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, scale) = (self.means[j], self.scales[j]);
            column.mapv_inplace(|v| (v - mean) / scale);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_scaled_columns_have_zero_mean_unit_variance() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        let out = scaler.transform(x.view()).unwrap();

        for column in out.axis_iter(Axis(1)) {
            let mean = column.sum() / 4.0;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let x = array![[5.0], [5.0], [5.0]];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        assert_eq!(scaler.scales(), &[1.0]);
        let out = scaler.transform(x.view()).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }
}

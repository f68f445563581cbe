//! Gradient Boosting Machine for binary classification
//!
//! Logistic-loss boosting over second-order regression trees, with row
//! subsampling, per-tree column sampling and positive-class reweighting.

use super::binning::{BinnedMatrix, MAX_BINS};
use super::tree::{RegressionTree, TreeParams};
use crate::error::{Result, ScoringError};
use ndarray::{Array1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// GBM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Fraction of rows sampled for each tree
    pub subsample: f64,
    /// Fraction of features sampled for each tree
    pub colsample_bytree: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    /// Minimum hessian sum in a child
    pub min_child_weight: f64,
    /// L1 regularization
    pub reg_alpha: f64,
    /// L2 regularization
    pub reg_lambda: f64,
    /// Weight multiplier for positive samples
    pub scale_pos_weight: f64,
    /// Random seed for row/column sampling
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.3,
            subsample: 1.0,
            colsample_bytree: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            reg_alpha: 0.0,
            reg_lambda: 1.0,
            scale_pos_weight: 1.0,
            seed: 42,
        }
    }
}

impl GbmParams {
    /// Negative-to-positive ratio used to rebalance the classes
    pub fn balanced_pos_weight(labels: &[f64]) -> Result<f64> {
        let n_pos = labels.iter().filter(|&&y| y > 0.5).count();
        if n_pos == 0 {
            return Err(ScoringError::InvalidData(
                "no positive labels to compute scale_pos_weight".to_string(),
            ));
        }
        Ok((labels.len() - n_pos) as f64 / n_pos as f64)
    }

    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if self.n_estimators == 0 || self.max_depth == 0 {
            return Err(ScoringError::InvalidData(
                "n_estimators and max_depth must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) || !in_unit(self.subsample) || !in_unit(self.colsample_bytree) {
            return Err(ScoringError::InvalidData(format!(
                "learning_rate must be > 0, subsample and colsample_bytree in (0, 1]: {:?}",
                self
            )));
        }
        if self.gamma < 0.0 || self.min_child_weight < 0.0 || self.reg_alpha < 0.0 || self.reg_lambda < 0.0 {
            return Err(ScoringError::InvalidData(
                "regularization terms must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_child_weight: self.min_child_weight,
            gamma: self.gamma,
            reg_alpha: self.reg_alpha,
            reg_lambda: self.reg_lambda,
            learning_rate: self.learning_rate,
        }
    }
}

/// Gradient boosted tree classifier with logistic loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbmClassifier {
    params: GbmParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl GbmClassifier {
    /// Create an unfitted classifier
    pub fn new(params: GbmParams) -> Self {
        Self {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Train on a preprocessed feature matrix and 0/1 labels
    pub fn fit(&mut self, x: ArrayView2<f64>, y: &[f64]) -> Result<()> {
        self.params.validate()?;
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(ScoringError::InvalidData("empty training matrix".to_string()));
        }
        if n_samples != y.len() {
            return Err(ScoringError::InvalidData(format!(
                "{} rows but {} labels",
                n_samples,
                y.len()
            )));
        }

        debug!(
            "Training GBM with {} samples, {} features, {} rounds",
            n_samples, n_features, self.params.n_estimators
        );

        let binned = BinnedMatrix::from_array(x, MAX_BINS);
        let tree_params = self.params.tree_params();
        let weights: Vec<f64> = y
            .iter()
            .map(|&t| if t > 0.5 { self.params.scale_pos_weight } else { 1.0 })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        let n_cols = ((n_features as f64 * self.params.colsample_bytree).ceil() as usize).clamp(1, n_features);
        let mut margins = vec![0.0; n_samples];
        let mut grad = vec![0.0; n_samples];
        let mut hess = vec![0.0; n_samples];
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            for i in 0..n_samples {
                let p = sigmoid(margins[i]);
                grad[i] = weights[i] * (p - y[i]);
                hess[i] = (weights[i] * p * (1.0 - p)).max(1e-16);
            }

            let rows: Vec<usize> = if self.params.subsample < 1.0 {
                (0..n_samples)
                    .filter(|_| rng.gen::<f64>() < self.params.subsample)
                    .collect()
            } else {
                (0..n_samples).collect()
            };

            let mut features: Vec<usize> = (0..n_features).collect();
            if n_cols < n_features {
                features.shuffle(&mut rng);
                features.truncate(n_cols);
                features.sort_unstable();
            }

            let tree = RegressionTree::fit(&binned, &grad, &hess, rows, &features, &tree_params);
            for (i, row) in x.axis_iter(Axis(0)).enumerate() {
                margins[i] += tree.predict_row(row);
            }
            trees.push(tree);
        }

        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    /// Raw log-odds for each row
    pub fn predict_margin(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if !self.is_trained() {
            return Err(ScoringError::NotTrained);
        }
        if x.ncols() != self.n_features {
            return Err(ScoringError::InvalidData(format!(
                "model trained on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        Ok(x.axis_iter(Axis(0))
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum())
            .collect())
    }

    /// Probability of the positive class for each row
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self.predict_margin(x)?.mapv(sigmoid))
    }

    /// Total split gain per feature, normalized to sum to one
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.accumulate_gain(&mut totals);
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::roc_auc;
    use crate::models::test_support::synthetic;
    use ndarray::Array2;

    fn small_params() -> GbmParams {
        GbmParams {
            n_estimators: 30,
            max_depth: 3,
            learning_rate: 0.3,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_learns_signal() {
        let (x, y) = synthetic(300);
        let mut model = GbmClassifier::new(small_params());
        model.fit(x.view(), &y).unwrap();

        let proba = model.predict_proba(x.view()).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        let auc = roc_auc(&y, proba.as_slice().unwrap()).unwrap();
        assert!(auc > 0.95, "auc = {}", auc);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = synthetic(200);
        let params = GbmParams {
            subsample: 0.7,
            colsample_bytree: 0.5,
            ..small_params()
        };
        let mut a = GbmClassifier::new(params.clone());
        let mut b = GbmClassifier::new(params);
        a.fit(x.view(), &y).unwrap();
        b.fit(x.view(), &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = GbmClassifier::new(GbmParams::default());
        let x = Array2::<f64>::zeros((1, 2));
        assert!(matches!(model.predict_proba(x.view()), Err(ScoringError::NotTrained)));
    }

    #[test]
    fn test_balanced_pos_weight() {
        let y = vec![0.0, 0.0, 0.0, 1.0];
        assert_eq!(GbmParams::balanced_pos_weight(&y).unwrap(), 3.0);
        assert!(GbmParams::balanced_pos_weight(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = synthetic(200);
        let mut model = GbmClassifier::new(small_params());
        model.fit(x.view(), &y).unwrap();
        let imp = model.feature_importances();
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }
}

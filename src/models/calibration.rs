//! Sigmoid (Platt) probability calibration
//!
//! The calibrated classifier is trained the cross-validated way: for every
//! stratified fold a booster is fitted on the remaining folds and a sigmoid is
//! fitted on its held-out probabilities. Predictions average the calibrated
//! outputs of all fold pairs.

use super::gbm::{GbmClassifier, GbmParams};
use crate::error::{Result, ScoringError};
use crate::evaluation::stratified_k_fold;
use ndarray::{Array1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const HESSIAN_RIDGE: f64 = 1e-12;

/// Logistic calibration: `p = 1 / (1 + exp(a * score + b))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit by Newton's method with backtracking on the smoothed-target log loss
    ///
    /// Targets are smoothed to `(n_pos + 1) / (n_pos + 2)` and `1 / (n_neg + 2)`
    /// to avoid overfitting the extremes.
    pub fn fit(scores: &[f64], labels: &[f64]) -> Result<Self> {
        if scores.len() != labels.len() || scores.is_empty() {
            return Err(ScoringError::InvalidData(format!(
                "calibration needs matching non-empty inputs, got {} scores and {} labels",
                scores.len(),
                labels.len()
            )));
        }

        let n_pos = labels.iter().filter(|&&y| y > 0.5).count() as f64;
        let n_neg = labels.len() as f64 - n_pos;
        let hi = (n_pos + 1.0) / (n_pos + 2.0);
        let lo = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = labels.iter().map(|&y| if y > 0.5 { hi } else { lo }).collect();

        let mut a = 0.0;
        let mut b = ((n_neg + 1.0) / (n_pos + 1.0)).ln();
        let mut fval = objective(scores, &targets, a, b);

        for _ in 0..MAX_ITER {
            let (mut h11, mut h22, mut h21) = (HESSIAN_RIDGE, HESSIAN_RIDGE, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);

            for (&f, &t) in scores.iter().zip(&targets) {
                let p = platt(a, b, f);
                let d2 = p * (1.0 - p);
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < 1e-5 && g2.abs() < 1e-5 {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let (na, nb) = (a + step * da, b + step * db);
                let nf = objective(scores, &targets, na, nb);
                if nf < fval + 1e-4 * step * gd {
                    a = na;
                    b = nb;
                    fval = nf;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                debug!("Platt line search stalled at a={:.4}, b={:.4}", a, b);
                break;
            }
        }

        Ok(Self { a, b })
    }

    /// Calibrated probability for one raw score
    pub fn transform(&self, score: f64) -> f64 {
        platt(self.a, self.b, score)
    }
}

/// `1 / (1 + exp(a*f + b))`, evaluated without overflow
fn platt(a: f64, b: f64, f: f64) -> f64 {
    let z = a * f + b;
    if z >= 0.0 {
        let e = (-z).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + z.exp())
    }
}

/// Cross-entropy of the smoothed targets
fn objective(scores: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    scores
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let z = a * f + b;
            if z >= 0.0 {
                t * z + (-z).exp().ln_1p()
            } else {
                (t - 1.0) * z + z.exp().ln_1p()
            }
        })
        .sum()
}

/// Booster paired with the sigmoid fitted on its held-out fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedPair {
    pub classifier: GbmClassifier,
    pub calibrator: PlattScaling,
}

impl CalibratedPair {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let raw = self.classifier.predict_proba(x)?;
        Ok(raw.mapv(|s| self.calibrator.transform(s)))
    }
}

/// Ensemble of calibrated boosters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedClassifier {
    params: GbmParams,
    pairs: Vec<CalibratedPair>,
}

impl CalibratedClassifier {
    /// Fit `n_folds` calibrated pairs on unshuffled stratified folds
    pub fn fit(params: &GbmParams, x: ArrayView2<f64>, y: &[f64], n_folds: usize) -> Result<Self> {
        let splits = stratified_k_fold(y, n_folds, None)?;
        info!(
            "Calibrating with {}-fold sigmoid scaling on {} samples",
            n_folds,
            y.len()
        );

        let pairs = splits
            .par_iter()
            .map(|split| {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train: Vec<f64> = split.train_indices.iter().map(|&i| y[i]).collect();
                let x_cal = x.select(Axis(0), &split.test_indices);
                let y_cal: Vec<f64> = split.test_indices.iter().map(|&i| y[i]).collect();

                let mut classifier = GbmClassifier::new(params.clone());
                classifier.fit(x_train.view(), &y_train)?;
                let raw = classifier.predict_proba(x_cal.view())?.to_vec();
                let calibrator = PlattScaling::fit(&raw, &y_cal)?;
                debug!("Fold calibrator a={:.4}, b={:.4}", calibrator.a, calibrator.b);

                Ok(CalibratedPair {
                    classifier,
                    calibrator,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            params: params.clone(),
            pairs,
        })
    }

    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    pub fn pairs(&self) -> &[CalibratedPair] {
        &self.pairs
    }

    /// Number of input features every booster expects
    pub fn n_features(&self) -> usize {
        self.pairs.first().map(|p| p.classifier.n_features()).unwrap_or(0)
    }

    /// Calibrated probability of the positive class for each row
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if self.pairs.is_empty() {
            return Err(ScoringError::NotTrained);
        }
        let mut total = Array1::zeros(x.nrows());
        for pair in &self.pairs {
            total += &pair.predict_proba(x)?;
        }
        Ok(total / self.pairs.len() as f64)
    }

    /// Mean normalized split gain per feature across the fold boosters
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features()];
        for pair in &self.pairs {
            for (t, v) in totals.iter_mut().zip(pair.classifier.feature_importances()) {
                *t += v;
            }
        }
        let n = self.pairs.len().max(1) as f64;
        totals.iter().map(|v| v / n).collect()
    }

    /// All boosters agree on the input width
    pub fn validate(&self) -> Result<()> {
        let n = self.n_features();
        let inconsistent = self
            .pairs
            .iter()
            .any(|p| p.classifier.n_features() != n || !p.classifier.is_trained());
        if self.pairs.is_empty() || inconsistent {
            return Err(ScoringError::SchemaMismatch(
                "calibrated model has untrained or inconsistent boosters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::noisy_synthetic;

    #[test]
    fn test_platt_is_monotone_increasing_for_informative_scores() {
        let scores: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let labels: Vec<f64> = scores.iter().map(|&s| if s > 0.5 { 1.0 } else { 0.0 }).collect();
        let platt = PlattScaling::fit(&scores, &labels).unwrap();

        assert!(platt.a < 0.0);
        let probs: Vec<f64> = scores.iter().map(|&s| platt.transform(s)).collect();
        assert!(probs.windows(2).all(|w| w[0] <= w[1]));
        assert!(probs[0] < 0.1 && probs[99] > 0.9);
    }

    #[test]
    fn test_platt_uninformative_scores_give_base_rate() {
        let scores = vec![0.5; 40];
        let labels: Vec<f64> = (0..40).map(|i| if i < 10 { 1.0 } else { 0.0 }).collect();
        let platt = PlattScaling::fit(&scores, &labels).unwrap();
        let p = platt.transform(0.5);
        assert!((p - 0.25).abs() < 0.05, "p = {}", p);
    }

    #[test]
    fn test_platt_rejects_mismatched_inputs() {
        assert!(PlattScaling::fit(&[0.1, 0.2], &[1.0]).is_err());
    }

    #[test]
    fn test_calibrated_classifier() {
        let (x, y) = noisy_synthetic(240);
        let params = GbmParams {
            n_estimators: 20,
            max_depth: 3,
            learning_rate: 0.2,
            ..Default::default()
        };
        let model = CalibratedClassifier::fit(&params, x.view(), &y, 3).unwrap();
        assert_eq!(model.pairs().len(), 3);
        assert_eq!(model.n_features(), 2);
        model.validate().unwrap();

        let proba = model.predict_proba(x.view()).unwrap();
        assert!(proba.iter().all(|&p| p > 0.0 && p < 1.0));
    }
}

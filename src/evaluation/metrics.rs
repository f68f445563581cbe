//! Binary classification metrics

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};

/// Area under the ROC curve via the Mann-Whitney U statistic
///
/// Tied scores share their average rank, so a tie between a positive and a
/// negative counts one half.
pub fn roc_auc(y_true: &[f64], scores: &[f64]) -> Result<f64> {
    if y_true.len() != scores.len() {
        return Err(ScoringError::InvalidData(format!(
            "{} labels but {} scores",
            y_true.len(),
            scores.len()
        )));
    }

    let n_pos = y_true.iter().filter(|&&y| y > 0.5).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(ScoringError::InvalidData(
            "ROC AUC is undefined with a single class".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; the tied group i..=j shares their mean
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if y_true[idx] > 0.5 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let (n_pos, n_neg) = (n_pos as f64, n_neg as f64);
    Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Mean squared error between probabilities and 0/1 outcomes
pub fn brier_score(y_true: &[f64], proba: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(proba)
        .map(|(y, p)| (p - y).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Fraction of rows where `proba >= threshold` matches the label
pub fn accuracy_at(y_true: &[f64], proba: &[f64], threshold: f64) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(proba)
        .filter(|(&y, &p)| (p >= threshold) == (y > 0.5))
        .count();
    correct as f64 / y_true.len() as f64
}

/// Metrics computed on the held-out test split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldoutMetrics {
    pub auc: f64,
    pub brier: f64,
    pub accuracy: f64,
}

impl HoldoutMetrics {
    pub fn compute(y_true: &[f64], proba: &[f64], threshold: f64) -> Result<Self> {
        Ok(Self {
            auc: roc_auc(y_true, proba)?,
            brier: brier_score(y_true, proba),
            accuracy: accuracy_at(y_true, proba, threshold),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_and_reversed_ranking() {
        let y = [0.0, 0.0, 1.0, 1.0];
        assert_relative_eq!(roc_auc(&y, &[0.1, 0.2, 0.8, 0.9]).unwrap(), 1.0);
        assert_relative_eq!(roc_auc(&y, &[0.9, 0.8, 0.2, 0.1]).unwrap(), 0.0);
    }

    #[test]
    fn test_ties_count_half() {
        let y = [0.0, 1.0];
        assert_relative_eq!(roc_auc(&y, &[0.5, 0.5]).unwrap(), 0.5);
    }

    #[test]
    fn test_known_value() {
        // Pairs (pos, neg): (0.35 > 0.1), (0.35 < 0.4), (0.8 > 0.1), (0.8 > 0.4) => 3/4
        let y = [0.0, 0.0, 1.0, 1.0];
        let s = [0.1, 0.4, 0.35, 0.8];
        assert_relative_eq!(roc_auc(&y, &s).unwrap(), 0.75);
    }

    #[test]
    fn test_single_class_is_error() {
        assert!(roc_auc(&[1.0, 1.0], &[0.2, 0.3]).is_err());
    }

    #[test]
    fn test_brier_and_accuracy() {
        let y = [0.0, 1.0, 1.0, 0.0];
        let p = [0.0, 1.0, 0.5, 0.5];
        assert_relative_eq!(brier_score(&y, &p), 0.125);
        // 0.5 >= 0.5 counts as positive
        assert_relative_eq!(accuracy_at(&y, &p, 0.5), 0.75);
    }
}

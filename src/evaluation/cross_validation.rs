//! Stratified K-Fold cross-validation

use crate::error::{Result, ScoringError};
use crate::models::{GbmClassifier, GbmParams};
use ndarray::{ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::metrics::roc_auc;

/// Cross-validation split
#[derive(Debug, Clone, PartialEq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Stratified K-Fold splits
///
/// Each class is divided into `n_folds` nearly equal chunks, so every test
/// fold carries the class ratio to within one sample. With `shuffle_seed`
/// the class members are shuffled first; without it they keep row order.
pub fn stratified_k_fold(labels: &[f64], n_folds: usize, shuffle_seed: Option<u64>) -> Result<Vec<CvSplit>> {
    if n_folds < 2 {
        return Err(ScoringError::InvalidData(format!(
            "n_folds must be at least 2, got {}",
            n_folds
        )));
    }

    let (mut negatives, mut positives): (Vec<usize>, Vec<usize>) =
        (0..labels.len()).partition(|&i| labels[i] <= 0.5);

    let smallest = negatives.len().min(positives.len());
    if smallest < n_folds {
        return Err(ScoringError::InvalidData(format!(
            "{} folds requested but the smallest class has {} members",
            n_folds, smallest
        )));
    }

    if let Some(seed) = shuffle_seed {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        negatives.shuffle(&mut rng);
        positives.shuffle(&mut rng);
    }

    let mut fold_of = vec![0usize; labels.len()];
    for class in [&negatives, &positives] {
        let base = class.len() / n_folds;
        let extra = class.len() % n_folds;
        let mut start = 0;
        for fold in 0..n_folds {
            let size = base + usize::from(fold < extra);
            for &idx in &class[start..start + size] {
                fold_of[idx] = fold;
            }
            start += size;
        }
    }

    Ok((0..n_folds)
        .map(|fold| {
            let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| fold_of[i] == fold);
            CvSplit {
                train_indices,
                test_indices,
            }
        })
        .collect())
}

/// Held-out ROC AUC of a fresh booster on each split, folds run in parallel
pub fn cross_val_auc(params: &GbmParams, x: ArrayView2<f64>, y: &[f64], splits: &[CvSplit]) -> Result<Vec<f64>> {
    splits
        .par_iter()
        .map(|split| {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train: Vec<f64> = split.train_indices.iter().map(|&i| y[i]).collect();
            let x_test = x.select(Axis(0), &split.test_indices);
            let y_test: Vec<f64> = split.test_indices.iter().map(|&i| y[i]).collect();

            let mut model = GbmClassifier::new(params.clone());
            model.fit(x_train.view(), &y_train)?;
            let proba = model.predict_proba(x_test.view())?.to_vec();
            roc_auc(&y_test, &proba)
        })
        .collect()
}

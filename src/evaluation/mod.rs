//! Model evaluation module
//!
//! Ranking and probability metrics plus stratified cross-validation.

mod cross_validation;
mod metrics;

pub use cross_validation::{cross_val_auc, stratified_k_fold, CvSplit};
pub use metrics::{accuracy_at, brier_score, roc_auc, HoldoutMetrics};

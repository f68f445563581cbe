//! Summary of a training run

use crate::artifacts::ArtifactPaths;
use crate::evaluation::HoldoutMetrics;
use crate::models::GbmParams;
use crate::tuning::CompletedTrial;
use serde::{Deserialize, Serialize};
use tracing::info;

/// What a training run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: String,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: Vec<String>,
    /// Highest mean CV AUC trial
    pub best_trial: CompletedTrial,
    /// Booster configuration used for the final calibrated fit
    pub best_params: GbmParams,
    pub trials: Vec<CompletedTrial>,
    pub holdout: HoldoutMetrics,
    /// `(feature, importance)` sorted by decreasing importance
    pub feature_importances: Vec<(String, f64)>,
    pub artifacts: ArtifactPaths,
}

impl TrainingReport {
    /// Mean CV AUC of the best trial
    pub fn best_cv_auc(&self) -> f64 {
        self.best_trial.value
    }

    /// Log a human-readable summary
    pub fn log_summary(&self, top_features: usize) {
        info!("=== Training summary (run {}) ===", self.run_id);
        info!("Train rows: {}, test rows: {}", self.n_train, self.n_test);
        info!(
            "Best trial {} with CV AUC {:.5}: {:?}",
            self.best_trial.number, self.best_trial.value, self.best_trial.params
        );
        info!(
            "Hold-out AUC {:.5}, Brier {:.5}, accuracy {:.4}",
            self.holdout.auc, self.holdout.brier, self.holdout.accuracy
        );
        info!("Top features by gain:");
        for (name, importance) in self.feature_importances.iter().take(top_features) {
            info!("  {:<40} {:.4}", name, importance);
        }
        if let Some(dir) = self.artifacts.model.parent() {
            info!("Artifacts saved in {}", dir.display());
        }
    }
}

//! Training pipeline

use super::report::TrainingReport;
use crate::artifacts::{new_run_id, ArtifactStore};
use crate::data::{load_training_csv, LabeledFrame};
use crate::error::{Result, ScoringError};
use crate::evaluation::{cross_val_auc, stratified_k_fold, HoldoutMetrics};
use crate::features::FeatureEngineer;
use crate::models::{CalibratedClassifier, GbmParams};
use crate::preprocessing::Preprocessor;
use crate::scoring::DECISION_THRESHOLD;
use crate::tuning::{gbm_params_from_trial, SearchSpace, Study, TpeSampler};
use crate::utils::TrainingConfig;
use tracing::{debug, info};

/// Configured training run
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: TrainingConfig,
    space: SearchSpace,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            space: SearchSpace::credit_gbm(),
        }
    }

    /// Replace the default booster search space
    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train from the configured CSV file
    pub fn run(&self) -> Result<TrainingReport> {
        let data = load_training_csv(&self.config.data_file)?;
        self.run_on(data)
    }

    /// Train on an already loaded table
    pub fn run_on(&self, mut data: LabeledFrame) -> Result<TrainingReport> {
        let cfg = &self.config;
        cfg.validate().map_err(|e| ScoringError::InvalidData(e.to_string()))?;

        let n_pos = data.n_positive();
        if n_pos == 0 || n_pos == data.n_samples() {
            return Err(ScoringError::TrainingFailed(format!(
                "labels contain a single class ({} of {} positive)",
                n_pos,
                data.n_samples()
            )));
        }

        FeatureEngineer::new().apply(&mut data.features)?;
        let feature_names = data.features.column_names().to_vec();
        info!("Engineered {} features: {}", feature_names.len(), feature_names.join(", "));

        let split = data.stratified_split(cfg.test_size, cfg.seed)?;
        info!(
            "Split {} rows into {} train / {} test",
            data.n_samples(),
            split.train.n_samples(),
            split.test.n_samples()
        );

        let preprocessor = Preprocessor::fit(&split.train.features)?;
        let x_train = preprocessor.transform_frame(&split.train.features)?;
        let x_test = preprocessor.transform_frame(&split.test.features)?;
        let y_train = &split.train.labels;
        let y_test = &split.test.labels;

        let scale_pos_weight = GbmParams::balanced_pos_weight(y_train)?;
        info!("scale_pos_weight = {:.4}", scale_pos_weight);

        let cv_splits = stratified_k_fold(y_train, cfg.cv_folds, Some(cfg.seed))?;
        let sampler = TpeSampler::new(cfg.seed).with_startup_trials(cfg.startup_trials);
        let mut study = Study::new(self.space.clone(), sampler);

        info!("Starting hyperparameter search: {} trials", cfg.n_trials);
        study.optimize(cfg.n_trials, |trial| {
            let params = gbm_params_from_trial(trial, scale_pos_weight, cfg.seed)?;
            let aucs = cross_val_auc(&params, x_train.view(), y_train, &cv_splits)?;
            debug!("Fold AUCs: {:?}", aucs);
            Ok(aucs.iter().sum::<f64>() / aucs.len() as f64)
        })?;

        let best_trial = study.require_best()?.clone();
        info!("Best trial: {:?}", best_trial.params);

        let best_params = gbm_params_from_trial(&best_trial.params, scale_pos_weight, cfg.seed)?;
        let model = CalibratedClassifier::fit(&best_params, x_train.view(), y_train, cfg.calibration_folds)?;

        let proba = model.predict_proba(x_test.view())?.to_vec();
        let holdout = HoldoutMetrics::compute(y_test, &proba, DECISION_THRESHOLD)?;
        info!(
            "Hold-out AUC {:.5}, Brier {:.5}, accuracy {:.4}",
            holdout.auc, holdout.brier, holdout.accuracy
        );

        let mut feature_importances: Vec<(String, f64)> = feature_names
            .iter()
            .cloned()
            .zip(model.feature_importances())
            .collect();
        feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));

        let run_id = new_run_id();
        let artifacts = ArtifactStore::new(&cfg.out_dir).save(&run_id, &model, &preprocessor)?;

        Ok(TrainingReport {
            run_id,
            n_train: split.train.n_samples(),
            n_test: split.test.n_samples(),
            feature_names,
            best_trial,
            best_params,
            trials: study.trials().to_vec(),
            holdout,
            feature_importances,
            artifacts,
        })
    }
}

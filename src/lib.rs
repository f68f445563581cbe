//! # Credit Scoring
//!
//! Gradient-boosted credit-risk scoring with hyperparameter search,
//! sigmoid probability calibration and a single-page scoring form.
//!
//! ## Modules
//!
//! - `data` - Labeled CSV loading, column frames and stratified splits
//! - `features` - Derived applicant features
//! - `preprocessing` - Median imputation and standard scaling
//! - `models` - Boosted trees and the calibrated classifier
//! - `evaluation` - ROC AUC, Brier score and stratified cross-validation
//! - `tuning` - Search space and TPE-driven study
//! - `artifacts` - Persisted model, preprocessor and feature list
//! - `training` - End-to-end training pipeline
//! - `scoring` - Immutable scoring context and single-record scoring
//! - `web` - Axum form endpoint
//! - `utils` - Configuration and logging setup

pub mod artifacts;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod preprocessing;
pub mod scoring;
pub mod training;
pub mod tuning;
pub mod utils;
pub mod web;

pub use error::{Result, ScoringError};
pub use scoring::{Prediction, ScoringContext};
pub use training::{TrainingPipeline, TrainingReport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifacts::ArtifactStore;
    pub use crate::data::{Frame, LabeledFrame, Split};
    pub use crate::features::FeatureEngineer;
    pub use crate::models::{CalibratedClassifier, GbmClassifier, GbmParams};
    pub use crate::preprocessing::Preprocessor;
    pub use crate::scoring::{Prediction, ScoringContext};
    pub use crate::training::{TrainingPipeline, TrainingReport};
    pub use crate::utils::Config;
}

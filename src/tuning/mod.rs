//! Hyperparameter search
//!
//! A bounded search space over the booster's hyperparameters and a study
//! that samples it with a Tree-structured Parzen Estimator.

mod search_space;
mod study;
mod tpe;

pub use search_space::{gbm_params_from_trial, Distribution, ParamSpec, SearchSpace, TrialParams};
pub use study::{CompletedTrial, Study};
pub use tpe::TpeSampler;

//! Search space definitions

use crate::error::{Result, ScoringError};
use crate::models::GbmParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sampled values keyed by parameter name
pub type TrialParams = BTreeMap<String, f64>;

/// Range a single parameter is drawn from (bounds inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    Int { low: i64, high: i64 },
    Float { low: f64, high: f64, log: bool },
}

impl Distribution {
    /// Bounds of the continuous space the sampler works in
    ///
    /// Log-scaled floats are searched in log space; integers get half a unit
    /// of slack on each side so every value has equal width after rounding.
    pub fn internal_bounds(&self) -> (f64, f64) {
        match *self {
            Distribution::Int { low, high } => (low as f64 - 0.5, high as f64 + 0.5),
            Distribution::Float { low, high, log: true } => (low.ln(), high.ln()),
            Distribution::Float { low, high, log: false } => (low, high),
        }
    }

    pub fn to_internal(&self, value: f64) -> f64 {
        match *self {
            Distribution::Float { log: true, .. } => value.ln(),
            _ => value,
        }
    }

    /// Map an internal value back to a valid parameter value
    pub fn from_internal(&self, internal: f64) -> f64 {
        match *self {
            Distribution::Int { low, high } => (internal.round() as i64).clamp(low, high) as f64,
            Distribution::Float { low, high, log: true } => internal.exp().clamp(low, high),
            Distribution::Float { low, high, log: false } => internal.clamp(low, high),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Distribution::Int { low, high } => value.fract() == 0.0 && value >= low as f64 && value <= high as f64,
            Distribution::Float { low, high, .. } => value >= low && value <= high,
        }
    }
}

/// Named parameter with its distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub distribution: Distribution,
}

/// Ordered collection of parameter specs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    params: Vec<ParamSpec>,
}

impl SearchSpace {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self { params }
    }

    /// Search space for the credit booster
    pub fn credit_gbm() -> Self {
        use Distribution::{Float, Int};

        let spec = |name: &str, distribution| ParamSpec {
            name: name.to_string(),
            distribution,
        };

        Self::new(vec![
            spec("n_estimators", Int { low: 200, high: 1000 }),
            spec("max_depth", Int { low: 3, high: 8 }),
            spec("learning_rate", Float { low: 0.01, high: 0.2, log: true }),
            spec("subsample", Float { low: 0.6, high: 1.0, log: false }),
            spec("colsample_bytree", Float { low: 0.6, high: 1.0, log: false }),
            spec("gamma", Float { low: 0.0, high: 1.0, log: false }),
            spec("min_child_weight", Int { low: 1, high: 10 }),
            spec("reg_alpha", Float { low: 0.0, high: 1.0, log: false }),
            spec("reg_lambda", Float { low: 1.0, high: 10.0, log: false }),
        ])
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Booster configuration for a sampled trial
///
/// Parameters the trial does not set keep their defaults.
pub fn gbm_params_from_trial(trial: &TrialParams, scale_pos_weight: f64, seed: u64) -> Result<GbmParams> {
    let mut params = GbmParams {
        scale_pos_weight,
        seed,
        ..Default::default()
    };

    for (name, &value) in trial {
        match name.as_str() {
            "n_estimators" => params.n_estimators = value as usize,
            "max_depth" => params.max_depth = value as usize,
            "learning_rate" => params.learning_rate = value,
            "subsample" => params.subsample = value,
            "colsample_bytree" => params.colsample_bytree = value,
            "gamma" => params.gamma = value,
            "min_child_weight" => params.min_child_weight = value,
            "reg_alpha" => params.reg_alpha = value,
            "reg_lambda" => params.reg_lambda = value,
            other => {
                return Err(ScoringError::InvalidData(format!(
                    "unknown hyperparameter '{}'",
                    other
                )))
            }
        }
    }

    params.validate()?;
    Ok(params)
}

//! Sequential optimization study

use super::search_space::{SearchSpace, TrialParams};
use super::tpe::TpeSampler;
use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Finished trial with its objective value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTrial {
    pub number: usize,
    pub params: TrialParams,
    pub value: f64,
}

/// Maximizing study driven by a TPE sampler
#[derive(Debug)]
pub struct Study {
    space: SearchSpace,
    sampler: TpeSampler,
    trials: Vec<CompletedTrial>,
}

impl Study {
    pub fn new(space: SearchSpace, sampler: TpeSampler) -> Self {
        Self {
            space,
            sampler,
            trials: Vec::new(),
        }
    }

    /// Run `n_trials` trials one after another
    ///
    /// Every trial runs. An objective error aborts the study; a non-finite
    /// value is recorded but kept out of the sampler's history.
    pub fn optimize<F>(&mut self, n_trials: usize, mut objective: F) -> Result<()>
    where
        F: FnMut(&TrialParams) -> Result<f64>,
    {
        for _ in 0..n_trials {
            let number = self.trials.len();
            let history: Vec<CompletedTrial> = self
                .trials
                .iter()
                .filter(|t| t.value.is_finite())
                .cloned()
                .collect();
            let params = self.sampler.sample(&self.space, &history);

            let value = objective(&params)?;
            if value.is_finite() {
                info!("Trial {} finished with value {:.5}", number, value);
            } else {
                warn!("Trial {} returned non-finite value {}", number, value);
            }

            self.trials.push(CompletedTrial { number, params, value });

            if let Some(best) = self.best_trial() {
                info!("Best is trial {} with value {:.5}", best.number, best.value);
            }
        }
        Ok(())
    }

    /// Highest-valued trial; the earliest one wins ties
    pub fn best_trial(&self) -> Option<&CompletedTrial> {
        self.trials
            .iter()
            .filter(|t| t.value.is_finite())
            .fold(None, |best: Option<&CompletedTrial>, t| match best {
                Some(b) if b.value >= t.value => Some(b),
                _ => Some(t),
            })
    }

    /// Best trial, or an error if no trial produced a finite value
    pub fn require_best(&self) -> Result<&CompletedTrial> {
        self.best_trial()
            .ok_or_else(|| ScoringError::TrainingFailed("no trial produced a finite objective value".to_string()))
    }

    pub fn trials(&self) -> &[CompletedTrial] {
        &self.trials
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }
}

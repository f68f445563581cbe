//! Tree-structured Parzen Estimator sampler
//!
//! Independent (per-parameter) TPE: after a number of uniformly random
//! startup trials, completed trials are split into a "good" group (top
//! `gamma(n)` by objective) and the rest. Each group gets a truncated
//! Gaussian mixture over the parameter's internal range; candidates are drawn
//! from the good mixture and the one maximizing `l(x) / g(x)` is kept.

use super::search_space::{SearchSpace, TrialParams};
use super::study::CompletedTrial;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution as _, Normal};
use statrs::distribution::{Continuous, ContinuousCDF, Normal as StatrsNormal};
use tracing::debug;

const MAX_GOOD_TRIALS: usize = 25;
const SAMPLE_ATTEMPTS: usize = 100;

/// TPE sampler for maximization studies
#[derive(Debug, Clone)]
pub struct TpeSampler {
    n_startup_trials: usize,
    n_ei_candidates: usize,
    rng: ChaCha8Rng,
}

impl TpeSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            n_startup_trials: 10,
            n_ei_candidates: 24,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Number of uniformly random trials before the model takes over
    pub fn with_startup_trials(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    pub fn with_ei_candidates(mut self, n: usize) -> Self {
        self.n_ei_candidates = n.max(1);
        self
    }

    /// Draw the parameters for the next trial
    pub fn sample(&mut self, space: &SearchSpace, history: &[CompletedTrial]) -> TrialParams {
        let mut params = TrialParams::new();

        if history.len() < self.n_startup_trials {
            for spec in space.params() {
                let (lo, hi) = spec.distribution.internal_bounds();
                let internal = self.rng.gen_range(lo..=hi);
                params.insert(spec.name.clone(), spec.distribution.from_internal(internal));
            }
            return params;
        }

        let mut ranked: Vec<&CompletedTrial> = history.iter().collect();
        // Best first; equal values keep trial order
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value).then(a.number.cmp(&b.number)));
        let n_good = gamma(ranked.len());
        let (good, bad) = ranked.split_at(n_good);

        for spec in space.params() {
            let d = spec.distribution;
            let observed = |trials: &[&CompletedTrial]| -> Vec<f64> {
                trials
                    .iter()
                    .filter_map(|t| t.params.get(&spec.name))
                    .map(|&v| d.to_internal(v))
                    .collect()
            };

            let bounds = d.internal_bounds();
            let below = ParzenEstimator::new(&observed(good), bounds);
            let above = ParzenEstimator::new(&observed(bad), bounds);

            let mut best_x = below.sample(&mut self.rng);
            let mut best_score = f64::NEG_INFINITY;
            for _ in 0..self.n_ei_candidates {
                let x = below.sample(&mut self.rng);
                let score = below.log_pdf(x) - above.log_pdf(x);
                if score > best_score {
                    best_score = score;
                    best_x = x;
                }
            }

            debug!("TPE picked {}={:.5} (log ratio {:.3})", spec.name, d.from_internal(best_x), best_score);
            params.insert(spec.name.clone(), d.from_internal(best_x));
        }

        params
    }
}

/// Size of the good group: 10% of completed trials, at least one, at most 25
fn gamma(n: usize) -> usize {
    ((n as f64 * 0.1).ceil() as usize).clamp(1, MAX_GOOD_TRIALS).min(n)
}

/// Equal-weight mixture of Gaussians truncated to `[low, high]`
#[derive(Debug, Clone)]
struct ParzenEstimator {
    mus: Vec<f64>,
    sigmas: Vec<f64>,
    low: f64,
    high: f64,
}

impl ParzenEstimator {
    /// Observations plus a wide prior centered on the range
    fn new(observations: &[f64], (low, high): (f64, f64)) -> Self {
        let range = high - low;
        let prior_mu = 0.5 * (low + high);

        let mut points: Vec<(f64, bool)> = observations.iter().map(|&x| (x, false)).collect();
        points.push((prior_mu, true));
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let min_sigma = range / (100.0_f64).min(1.0 + points.len() as f64);
        let n = points.len();

        let mut mus = Vec::with_capacity(n);
        let mut sigmas = Vec::with_capacity(n);
        for (k, &(mu, is_prior)) in points.iter().enumerate() {
            let sigma = if is_prior || n == 1 {
                range
            } else {
                let left = (k > 0).then(|| mu - points[k - 1].0);
                let right = (k + 1 < n).then(|| points[k + 1].0 - mu);
                left.into_iter().chain(right).fold(0.0_f64, f64::max).clamp(min_sigma, range)
            };
            mus.push(mu);
            sigmas.push(sigma);
        }

        Self { mus, sigmas, low, high }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let k = rng.gen_range(0..self.mus.len());
        let (mu, sigma) = (self.mus[k], self.sigmas[k]);

        if let Ok(normal) = Normal::new(mu, sigma) {
            for _ in 0..SAMPLE_ATTEMPTS {
                let x = normal.sample(rng);
                if x >= self.low && x <= self.high {
                    return x;
                }
            }
        }
        mu.clamp(self.low, self.high)
    }

    fn log_pdf(&self, x: f64) -> f64 {
        let weight = 1.0 / self.mus.len() as f64;
        let density: f64 = self
            .mus
            .iter()
            .zip(&self.sigmas)
            .filter_map(|(&mu, &sigma)| {
                let normal = StatrsNormal::new(mu, sigma).ok()?;
                let mass = normal.cdf(self.high) - normal.cdf(self.low);
                (mass > 0.0).then(|| weight * normal.pdf(x) / mass)
            })
            .sum();
        density.max(f64::MIN_POSITIVE).ln()
    }
}

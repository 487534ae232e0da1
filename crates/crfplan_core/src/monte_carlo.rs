//! Monte Carlo uncertainty propagation
//!
//! Each trial perturbs the uncertain parameters with independent Gaussian
//! draws and evaluates one per-hectare NPV over a fixed horizon. Trials run
//! in batches whose RNG seeds are drawn in order from a master RNG, so a
//! given seed produces the same samples whether batches run in parallel or
//! not.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, SimulationError};
use crate::evaluate::ModelPoint;
use crate::financial::{self, FIXED_DISCOUNT_RATE, FIXED_HORIZON_YEARS};
use crate::model::{MonteCarloSample, MonteCarloSummary};
use crate::progress::RunProgress;
use crate::stats;

const MAX_BATCH_SIZE: usize = 100;

fn default_trials() -> usize {
    1000
}

fn default_seed() -> u64 {
    42
}

fn default_horizon_years() -> u32 {
    FIXED_HORIZON_YEARS
}

fn default_discount_rate() -> f64 {
    FIXED_DISCOUNT_RATE
}

fn default_emission_sigma() -> f64 {
    0.20
}

fn default_carbon_price_sigma() -> f64 {
    0.30
}

fn default_yield_impact_sigma() -> f64 {
    0.10
}

fn default_fertilizer_price_sigma() -> f64 {
    0.15
}

/// Relative standard deviations of the Gaussian perturbations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationPolicy {
    /// Both emission rates, clamped at 0
    #[serde(default = "default_emission_sigma")]
    pub emission: f64,
    /// Clamped at 0
    #[serde(default = "default_carbon_price_sigma")]
    pub carbon_price: f64,
    /// Of the impact's magnitude; only drawn when the impact is non-zero
    #[serde(default = "default_yield_impact_sigma")]
    pub yield_impact: f64,
    /// Both fertilizer prices, clamped at 0
    #[serde(default = "default_fertilizer_price_sigma")]
    pub fertilizer_price: f64,
}

impl Default for PerturbationPolicy {
    fn default() -> Self {
        Self {
            emission: default_emission_sigma(),
            carbon_price: default_carbon_price_sigma(),
            yield_impact: default_yield_impact_sigma(),
            fertilizer_price: default_fertilizer_price_sigma(),
        }
    }
}

/// Configuration for Monte Carlo runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// NPV horizon of each trial
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
    #[serde(default)]
    pub perturbation: PerturbationPolicy,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            seed: default_seed(),
            horizon_years: default_horizon_years(),
            discount_rate: default_discount_rate(),
            perturbation: PerturbationPolicy::default(),
        }
    }
}

/// All trial samples plus their summary
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloRun {
    pub samples: Vec<MonteCarloSample>,
    pub summary: MonteCarloSummary,
}

/// `mean + N(0, 1) * |mean| * relative_sigma`
fn perturb<R: Rng + ?Sized>(rng: &mut R, mean: f64, relative_sigma: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + z * mean.abs() * relative_sigma
}

fn draw_trial<R: Rng + ?Sized>(
    rng: &mut R,
    base: &ModelPoint,
    config: &MonteCarloConfig,
) -> MonteCarloSample {
    let policy = &config.perturbation;
    let mut point = *base;

    point.conventional_emission =
        perturb(rng, base.conventional_emission, policy.emission).max(0.0);
    point.treatment_emission = perturb(rng, base.treatment_emission, policy.emission).max(0.0);
    point.carbon_price = perturb(rng, base.carbon_price, policy.carbon_price).max(0.0);
    if base.yield_impact_pct != 0.0 {
        point.yield_impact_pct = perturb(rng, base.yield_impact_pct, policy.yield_impact);
    }
    point.price_conventional =
        perturb(rng, base.price_conventional, policy.fertilizer_price).max(0.0);
    point.price_treatment = perturb(rng, base.price_treatment, policy.fertilizer_price).max(0.0);

    let npv = financial::npv(
        point.net_annual_flow_per_ha(),
        config.horizon_years,
        config.discount_rate,
    );

    MonteCarloSample {
        conventional_emission: point.conventional_emission,
        treatment_emission: point.treatment_emission,
        carbon_price: point.carbon_price,
        yield_impact_pct: point.yield_impact_pct,
        price_conventional: point.price_conventional,
        price_treatment: point.price_treatment,
        npv,
    }
}

fn run_batch(
    seed: u64,
    size: usize,
    base: &ModelPoint,
    config: &MonteCarloConfig,
    progress: Option<&RunProgress>,
) -> Option<Vec<MonteCarloSample>> {
    if progress.is_some_and(RunProgress::should_stop) {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = (0..size)
        .map(|_| draw_trial(&mut rng, base, config))
        .collect();
    if let Some(p) = progress {
        p.add(size);
    }
    Some(samples)
}

/// Run `config.trials` trials around `base`.
///
/// Returns [`SimulationError::Cancelled`] if the progress handle is
/// cancelled or its deadline passes before every batch has run.
pub fn run_monte_carlo(
    base: &ModelPoint,
    config: &MonteCarloConfig,
    progress: Option<&RunProgress>,
) -> Result<MonteCarloRun> {
    let _span = tracing::debug_span!("monte_carlo", trials = config.trials, seed = config.seed)
        .entered();

    let num_batches = config.trials.div_ceil(MAX_BATCH_SIZE);
    let mut master = StdRng::seed_from_u64(config.seed);
    let batches: Vec<(u64, usize)> = (0..num_batches)
        .map(|i| {
            let size = if i == num_batches - 1 {
                config.trials - i * MAX_BATCH_SIZE
            } else {
                MAX_BATCH_SIZE
            };
            (master.next_u64(), size)
        })
        .collect();

    #[cfg(feature = "parallel")]
    let results: Vec<Option<Vec<MonteCarloSample>>> = batches
        .par_iter()
        .map(|&(seed, size)| run_batch(seed, size, base, config, progress))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Option<Vec<MonteCarloSample>>> = batches
        .iter()
        .map(|&(seed, size)| run_batch(seed, size, base, config, progress))
        .collect();

    let mut samples = Vec::with_capacity(config.trials);
    for batch in results {
        match batch {
            Some(batch) => samples.extend(batch),
            None => {
                tracing::debug!("monte carlo run stopped before completion");
                return Err(SimulationError::Cancelled);
            }
        }
    }

    let npvs: Vec<f64> = samples.iter().map(|s| s.npv).collect();
    let summary = summarize(&npvs, config.seed);
    Ok(MonteCarloRun { samples, summary })
}

/// Summary statistics of per-trial NPVs. An empty slice gives an all-zero
/// summary.
#[must_use]
pub fn summarize(npvs: &[f64], seed: u64) -> MonteCarloSummary {
    if npvs.is_empty() {
        return MonteCarloSummary {
            seed,
            ..Default::default()
        };
    }
    let sorted = stats::sorted(npvs);
    let viable = npvs.iter().filter(|&&v| v > 0.0).count();
    MonteCarloSummary {
        trials: npvs.len(),
        seed,
        mean: stats::mean(npvs),
        std_dev: stats::std_dev(npvs),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p2_5: stats::percentile_sorted(&sorted, 2.5),
        p97_5: stats::percentile_sorted(&sorted, 97.5),
        probability_viable: viable as f64 / npvs.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_counts_strictly_positive() {
        let summary = summarize(&[-1.0, 0.0, 2.0, 3.0], 7);
        assert_eq!(summary.trials, 4);
        assert_eq!(summary.seed, 7);
        assert!((summary.probability_viable - 0.5).abs() < 1e-12);
        assert_eq!(summary.min, -1.0);
        assert_eq!(summary.max, 3.0);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], 3);
        assert_eq!(summary.trials, 0);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.probability_viable, 0.0);
    }

    #[test]
    fn test_zero_sigma_reproduces_baseline() {
        let mut rng = StdRng::seed_from_u64(1);
        let v = perturb(&mut rng, 12.5, 0.0);
        assert_eq!(v, 12.5);
    }
}

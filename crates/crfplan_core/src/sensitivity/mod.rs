//! Sobol global sensitivity analysis
//!
//! Builds a Saltelli design over a bounded parameter space, evaluates the
//! model at every row and estimates first-, second- and total-order indices.
//!
//! Row evaluation is parallel (with the `parallel` feature) and keeps row
//! order, so each output stays paired with its input row.

mod analyze;
mod config;
mod sampling;
mod sequence;

pub use config::{MAX_PARAMETERS, SobolConfig, SobolParameter, SobolProblem, SobolTarget};
pub use sampling::{block_size, saltelli_design};
pub use sequence::{MAX_DIMENSIONS, SobolSequence};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, SimulationError};
use crate::evaluate::ModelPoint;
use crate::financial;
use crate::model::{SecondOrderIndex, SobolIndex, SobolResult};
use crate::progress::RunProgress;

/// Sampling noise allowed between S1 and ST when checking results
pub const VIOLATION_TOLERANCE: f64 = 1e-3;

const EVAL_CHUNK: usize = 256;

fn evaluate_chunk<F>(
    rows: &[Vec<f64>],
    model: &F,
    progress: Option<&RunProgress>,
) -> Option<Vec<f64>>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    if progress.is_some_and(RunProgress::should_stop) {
        return None;
    }
    let out = rows.iter().map(|row| model(row.as_slice())).collect();
    if let Some(p) = progress {
        p.add(rows.len());
    }
    Some(out)
}

/// Sensitivity of an arbitrary model over `problem`.
///
/// `model` receives one scaled design row (one value per parameter, in
/// problem order). Non-finite outputs are counted and replaced by 0.
pub fn analyze_model<F>(
    problem: &SobolProblem,
    config: &SobolConfig,
    progress: Option<&RunProgress>,
    model: F,
) -> Result<SobolResult>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    let rows = saltelli_design(problem, config.base_samples)?;
    let k = problem.len();
    let _span = tracing::debug_span!(
        "sobol",
        parameters = k,
        base_samples = config.base_samples,
        rows = rows.len()
    )
    .entered();

    #[cfg(feature = "parallel")]
    let chunks: Vec<Option<Vec<f64>>> = rows
        .par_chunks(EVAL_CHUNK)
        .map(|chunk| evaluate_chunk(chunk, &model, progress))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let chunks: Vec<Option<Vec<f64>>> = rows
        .chunks(EVAL_CHUNK)
        .map(|chunk| evaluate_chunk(chunk, &model, progress))
        .collect();

    let mut outputs = Vec::with_capacity(rows.len());
    for chunk in chunks {
        outputs.extend(chunk.ok_or(SimulationError::Cancelled)?);
    }

    let mut substituted = 0;
    for y in &mut outputs {
        if !y.is_finite() {
            *y = 0.0;
            substituted += 1;
        }
    }
    if substituted > 0 {
        tracing::warn!(substituted, "non-finite sensitivity evaluations replaced by 0");
    }

    let separated = analyze::Separated::new(&outputs, k);
    let est = analyze::estimate(
        &separated,
        k,
        config.second_order,
        config.resamples,
        config.confidence_z,
        config.seed,
    );

    let mut indices: Vec<SobolIndex> = problem
        .parameters
        .iter()
        .enumerate()
        .map(|(i, p)| SobolIndex {
            name: p.name.clone(),
            s1: est.s1[i],
            s1_conf: est.s1_conf[i],
            st: est.st[i],
            st_conf: est.st_conf[i],
        })
        .collect();
    indices.sort_by(|a, b| b.st.total_cmp(&a.st));

    let second_order = est
        .s2
        .into_iter()
        .map(|(j, l, s2)| SecondOrderIndex {
            first: problem.parameters[j].name.clone(),
            second: problem.parameters[l].name.clone(),
            s2,
        })
        .collect();

    if est.clamped > 0 {
        tracing::debug!(
            clamped = est.clamped,
            "total-order estimates raised to first-order estimates"
        );
    }

    Ok(SobolResult {
        indices,
        second_order,
        base_samples: config.base_samples,
        evaluations: outputs.len(),
        substituted_evaluations: substituted,
        clamped_total_order: est.clamped,
    })
}

/// Sensitivity of per-hectare NPV around `base`
pub fn run_sobol(
    base: &ModelPoint,
    problem: &SobolProblem,
    config: &SobolConfig,
    progress: Option<&RunProgress>,
) -> Result<SobolResult> {
    analyze_model(problem, config, progress, |row| {
        let mut point = *base;
        for (p, &v) in problem.parameters.iter().zip(row) {
            p.target.apply(&mut point, v);
        }
        financial::npv(
            point.net_annual_flow_per_ha(),
            config.horizon_years,
            config.discount_rate,
        )
    })
}

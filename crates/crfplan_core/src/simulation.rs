//! Single simulation invocation
//!
//! Runs every engine for one study and input set and gathers the outputs
//! into a [`SimulationReport`].

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::evaluate::{ModelPoint, break_even_carbon_price};
use crate::financial;
use crate::model::{
    MonteCarloSummary, PriceProvenance, SimulationInputs, SimulationReport, SobolResult,
    StudyParameters,
};
use crate::monte_carlo::{MonteCarloConfig, run_monte_carlo};
use crate::progress::RunProgress;
use crate::scenarios::{ScenarioConfig, compare_scenarios};
use crate::sensitivity::{SobolConfig, SobolProblem, block_size, run_sobol};

fn default_true() -> bool {
    true
}

/// Which engines to run and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    #[serde(default)]
    pub sobol: SobolConfig,
    #[serde(default)]
    pub scenarios: ScenarioConfig,
    /// Skip the Sobol engine when false; the report then holds an empty
    /// sensitivity table
    #[serde(default = "default_true")]
    pub run_sensitivity: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            monte_carlo: MonteCarloConfig::default(),
            sobol: SobolConfig::default(),
            scenarios: ScenarioConfig::default(),
            run_sensitivity: true,
        }
    }
}

/// Run the full analysis for one study.
///
/// Invalid inputs are replaced by defaults and listed in the report's
/// warnings. Fails only when `progress` stops the run or the default
/// sensitivity problem cannot be built.
pub fn simulate(
    study: &StudyParameters,
    inputs: &SimulationInputs,
    options: &AnalysisOptions,
    provenance: PriceProvenance,
    progress: Option<&RunProgress>,
) -> Result<SimulationReport> {
    let _span = tracing::info_span!("simulate", study = study.id).entered();

    let (inputs, warnings) = inputs.sanitized();
    let base = ModelPoint::baseline(study, &inputs);

    let deterministic = base.evaluate(inputs.area_ha);
    let cash_flows = financial::cash_flow_series(
        deterministic.net_annual_flow_per_ha,
        inputs.horizon_years,
        inputs.discount_rate,
    );
    let break_even = break_even_carbon_price(&deterministic, inputs.fx_rate);
    tracing::debug!(
        npv = cash_flows.npv,
        payback_year = cash_flows.payback_year,
        "deterministic model evaluated"
    );

    if let Some(p) = progress {
        p.reset(options.monte_carlo.trials);
    }
    let monte_carlo: MonteCarloSummary =
        run_monte_carlo(&base, &options.monte_carlo, progress)?.summary;

    let sensitivity = if options.run_sensitivity {
        let problem = SobolProblem::around_baseline(&base);
        if let Some(p) = progress {
            p.reset(options.sobol.base_samples * block_size(problem.len()));
        }
        run_sobol(&base, &problem, &options.sobol, progress)?
    } else {
        SobolResult::default()
    };

    let scenarios = compare_scenarios(
        &base,
        &options.scenarios,
        inputs.horizon_years,
        inputs.discount_rate,
    );

    Ok(SimulationReport {
        study_id: study.id.to_string(),
        inputs,
        warnings,
        provenance,
        deterministic,
        cash_flows,
        break_even_carbon_price: break_even,
        monte_carlo,
        sensitivity,
        scenarios,
    })
}

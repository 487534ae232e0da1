//! Simulation outputs
//!
//! Plain data handed to the presentation layer. Every value here is derived
//! from a run's inputs and seed; nothing is cached between runs.

use serde::{Deserialize, Serialize};

use super::inputs::{InputWarning, SimulationInputs};

/// A quantity expressed for the whole area and per hectare
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaAmount {
    pub total: f64,
    pub per_ha: f64,
}

impl AreaAmount {
    #[must_use]
    pub fn from_per_ha(per_ha: f64, area_ha: f64) -> Self {
        Self {
            total: per_ha * area_ha,
            per_ha,
        }
    }
}

/// Carbon-credit revenue in both currencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonRevenue {
    pub local: f64,
    pub foreign: f64,
}

/// Production of a two-crop rotation under one treatment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationYield {
    /// Primary crop (t)
    pub primary: AreaAmount,
    /// Secondary crop (t)
    pub secondary: AreaAmount,
    /// Both crops combined (t)
    pub combined: AreaAmount,
    /// Production value (currency)
    pub value: AreaAmount,
}

/// Deterministic model output for one set of inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeterministicResult {
    /// Emission delta in kg N/ha
    pub emission_delta_kg_n_per_ha: f64,
    /// t-CO2e avoided
    pub emission_reduction: AreaAmount,
    pub cost_conventional: AreaAmount,
    pub cost_treatment: AreaAmount,
    pub yield_conventional: RotationYield,
    pub yield_treatment: RotationYield,
    /// Revenue per hectare
    pub carbon_revenue_per_ha: CarbonRevenue,
    /// Revenue for the whole area
    pub carbon_revenue_total: CarbonRevenue,
    /// Treatment minus conventional fertilizer cost, per hectare
    pub incremental_cost_per_ha: f64,
    /// Production value gained (or lost) per hectare
    pub yield_benefit_per_ha: f64,
    /// Revenue + benefit - incremental cost, per hectare and year
    pub net_annual_flow_per_ha: f64,
}

/// Carbon price at which the switch breaks even
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BreakEvenPrice {
    /// Foreign currency per t-CO2e
    Price(f64),
    /// The switch does not reduce emissions, so no price can pay for it
    NotApplicable,
}

/// Discounted annual flows over the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSeries {
    /// Undiscounted net flow per hectare and year
    pub annual_flow: f64,
    pub discount_rate: f64,
    /// Discounted flow for years 1..=horizon
    pub discounted: Vec<f64>,
    /// Running sum of `discounted`
    pub cumulative: Vec<f64>,
    pub npv: f64,
    /// First year whose cumulative sum is non-negative, or horizon + 1
    pub payback_year: u32,
}

impl CashFlowSeries {
    #[must_use]
    pub fn horizon(&self) -> u32 {
        self.discounted.len() as u32
    }

    /// Whether the investment is recovered within the horizon
    #[must_use]
    pub fn recovered(&self) -> bool {
        self.payback_year <= self.horizon()
    }
}

/// One Monte Carlo draw and its NPV
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSample {
    pub conventional_emission: f64,
    pub treatment_emission: f64,
    pub carbon_price: f64,
    pub yield_impact_pct: f64,
    pub price_conventional: f64,
    pub price_treatment: f64,
    pub npv: f64,
}

/// Distribution of per-hectare NPV over all trials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub trials: usize,
    pub seed: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// 2.5th percentile
    pub p2_5: f64,
    /// 97.5th percentile
    pub p97_5: f64,
    /// Fraction of trials with NPV > 0
    pub probability_viable: f64,
}

/// First- and total-order indices for one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolIndex {
    pub name: String,
    pub s1: f64,
    /// 95% confidence half-width
    pub s1_conf: f64,
    pub st: f64,
    pub st_conf: f64,
}

/// Interaction index of a parameter pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondOrderIndex {
    pub first: String,
    pub second: String,
    pub s2: f64,
}

/// Sensitivity table, sorted by descending total-order index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SobolResult {
    pub indices: Vec<SobolIndex>,
    pub second_order: Vec<SecondOrderIndex>,
    pub base_samples: usize,
    pub evaluations: usize,
    /// Evaluations that could not be computed and were counted as 0
    pub substituted_evaluations: usize,
    /// Parameters whose total-order estimate fell below the first-order
    /// estimate and was raised to it
    #[serde(default)]
    pub clamped_total_order: usize,
}

impl SobolResult {
    /// Parameters whose first-order index exceeds the total-order index by
    /// more than `tolerance`
    pub fn violations(&self, tolerance: f64) -> impl Iterator<Item = &SobolIndex> {
        self.indices
            .iter()
            .filter(move |ix| ix.s1 - ix.st > tolerance)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SobolIndex> {
        self.indices.iter().find(|ix| ix.name == name)
    }
}

/// NPV under one carbon-price multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub multiplier: f64,
    /// Foreign currency per t-CO2e after applying the multiplier
    pub carbon_price: f64,
    pub npv: f64,
    pub viable: bool,
}

/// All scenarios plus the extremes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenarios: Vec<Scenario>,
    pub best_index: Option<usize>,
    pub worst_index: Option<usize>,
}

impl ScenarioComparison {
    #[must_use]
    pub fn best(&self) -> Option<&Scenario> {
        self.best_index.and_then(|i| self.scenarios.get(i))
    }

    #[must_use]
    pub fn worst(&self) -> Option<&Scenario> {
        self.worst_index.and_then(|i| self.scenarios.get(i))
    }

    #[must_use]
    pub fn viable_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.viable).count()
    }
}

/// Where the market inputs came from, carried through for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceProvenance {
    pub carbon_source: String,
    pub carbon_is_live: bool,
    pub fx_source: String,
    pub fx_is_live: bool,
}

impl Default for PriceProvenance {
    fn default() -> Self {
        Self {
            carbon_source: "Reference".to_string(),
            carbon_is_live: false,
            fx_source: "Reference".to_string(),
            fx_is_live: false,
        }
    }
}

/// Everything a single simulation invocation produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub study_id: String,
    /// Inputs after default substitution
    pub inputs: SimulationInputs,
    pub warnings: Vec<InputWarning>,
    pub provenance: PriceProvenance,
    pub deterministic: DeterministicResult,
    pub cash_flows: CashFlowSeries,
    pub break_even_carbon_price: BreakEvenPrice,
    pub monte_carlo: MonteCarloSummary,
    pub sensitivity: SobolResult,
    pub scenarios: ScenarioComparison,
}

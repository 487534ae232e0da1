mod inputs;
mod results;
mod studies;

pub use inputs::{
    DEFAULT_AREA_HA, DEFAULT_CARBON_PRICE, DEFAULT_DISCOUNT_RATE, DEFAULT_DOSAGE_KG_N_PER_HA,
    DEFAULT_FX_RATE, DEFAULT_HORIZON_YEARS, DEFAULT_N_CONTENT_CONVENTIONAL,
    DEFAULT_N_CONTENT_TREATMENT, DEFAULT_PRICE_CONVENTIONAL, DEFAULT_PRICE_TREATMENT,
    InputWarning, MAX_HORIZON_YEARS, SimulationInputs, Treatment,
};
pub use results::{
    AreaAmount, BreakEvenPrice, CarbonRevenue, CashFlowSeries, DeterministicResult,
    MonteCarloSample, MonteCarloSummary, PriceProvenance, RotationYield, ScenarioComparison,
    Scenario, SecondOrderIndex, SimulationReport, SobolIndex, SobolResult,
};
pub use studies::{
    AreaUnit, CropBaseline, STUDIES, StudyParameters, default_study, delta_per_ha, yield_factor,
};

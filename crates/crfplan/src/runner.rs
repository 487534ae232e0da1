//! Resolves a [`RunConfig`] against the price board and runs the core

use crfplan_core::model::{SimulationInputs, StudyParameters};
use crfplan_core::{RunProgress, SimulationReport, simulate};

use crate::config::RunConfig;
use crate::prices::{Commodity, MarketOrigin, PriceBoard};

/// Study inputs with market quotes applied.
///
/// Carbon price and FX always come from the board. Crop prices come from
/// the board unless the run file sets them explicitly.
pub fn market_inputs(
    config: &RunConfig,
    study: &StudyParameters,
    board: &PriceBoard,
) -> (SimulationInputs, crfplan_core::PriceProvenance) {
    let carbon = board.get_carbon_price();
    let fx = board.get_fx_rate();
    let mut inputs = config.inputs.apply(study).with_market(carbon.value, fx.value);

    if config.inputs.product_price.is_none()
        && let Some(c) = Commodity::from_crop_name(study.primary_crop.name)
    {
        inputs.product_price = board.get_commodity_price(c).value;
    }
    if config.inputs.secondary_price.is_none()
        && let Some(c) = study
            .secondary_crop
            .and_then(|crop| Commodity::from_crop_name(crop.name))
    {
        inputs.secondary_price = board.get_commodity_price(c).value;
    }

    (inputs, PriceBoard::provenance(&carbon, &fx))
}

/// Run one configured simulation
pub fn execute(
    config: &RunConfig,
    origin: MarketOrigin,
    progress: Option<&RunProgress>,
) -> color_eyre::Result<SimulationReport> {
    let study = config.resolve_study()?;
    let board = PriceBoard::from_settings(&config.prices.board_settings(origin));
    let (inputs, provenance) = market_inputs(config, study, &board);

    tracing::info!(
        study = study.id,
        carbon_price = inputs.carbon_price,
        carbon_source = %provenance.carbon_source,
        fx_rate = inputs.fx_rate,
        "starting simulation"
    );

    let report = simulate(study, &inputs, &config.analysis, provenance, progress)?;
    for w in &report.warnings {
        tracing::warn!(field = %w.field, substituted = w.substituted, "input replaced");
    }
    Ok(report)
}

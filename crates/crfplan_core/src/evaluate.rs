//! Deterministic economic-emission model
//!
//! Pure, total functions: every input produces a value. Invalid inputs
//! (non-positive nitrogen fractions, non-finite prices) degrade to zero
//! instead of propagating NaN or panicking.

use crate::model::{
    AreaAmount, AreaUnit, BreakEvenPrice, CarbonRevenue, DeterministicResult, RotationYield,
    SimulationInputs, StudyParameters, Treatment, delta_per_ha, yield_factor,
};

/// Mass ratio N2O / N2 (44/28)
pub const N_TO_N2O: f64 = 44.0 / 28.0;
/// 100-year global warming potential of N2O (AR6)
pub const GWP_N2O: f64 = 273.0;
pub const KG_PER_TONNE: f64 = 1000.0;

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Convert a nitrogen emission delta (kg N/ha) into t-CO2e.
///
/// Negative deltas are an emission increase and stay negative.
#[must_use]
pub fn emission_to_co2e(delta_n_kg_per_ha: f64, area_ha: f64) -> AreaAmount {
    let per_ha = finite_or_zero(delta_n_kg_per_ha * N_TO_N2O / KG_PER_TONNE * GWP_N2O);
    AreaAmount::from_per_ha(per_ha, finite_or_zero(area_ha))
}

/// Fertilizer cost for the selected treatment.
///
/// Product mass is `dosage / n_content` kg/ha; cost is that mass in tonnes
/// times the price per tonne. A nitrogen fraction that is not strictly
/// positive yields zero cost.
#[must_use]
pub fn fertilizer_cost(
    treatment: Treatment,
    area_ha: f64,
    price_conventional: f64,
    price_treatment: f64,
    dosage_kg_n_per_ha: f64,
    n_content_conventional: f64,
    n_content_treatment: f64,
) -> AreaAmount {
    let (price, n_content) = match treatment {
        Treatment::Conventional => (price_conventional, n_content_conventional),
        Treatment::ControlledRelease => (price_treatment, n_content_treatment),
    };
    if !(n_content.is_finite() && n_content > 0.0) {
        return AreaAmount::default();
    }
    let mass_t = dosage_kg_n_per_ha / n_content / KG_PER_TONNE;
    AreaAmount::from_per_ha(finite_or_zero(mass_t * price), finite_or_zero(area_ha))
}

/// Yield under a treatment for a study's yield impact
#[must_use]
pub fn yield_result(
    treatment: Treatment,
    base_yield_per_ha: f64,
    area_ha: f64,
    study: &StudyParameters,
) -> AreaAmount {
    yield_with_impact(treatment, base_yield_per_ha, area_ha, study.yield_impact_pct)
}

/// Yield under a treatment for an explicit yield-impact percentage
#[must_use]
pub fn yield_with_impact(
    treatment: Treatment,
    base_yield_per_ha: f64,
    area_ha: f64,
    yield_impact_pct: f64,
) -> AreaAmount {
    let factor = match treatment {
        Treatment::Conventional => 1.0,
        Treatment::ControlledRelease => yield_factor(yield_impact_pct),
    };
    AreaAmount::from_per_ha(
        finite_or_zero(base_yield_per_ha * factor),
        finite_or_zero(area_ha),
    )
}

/// Two-crop rotation yield; the study factor applies to both crops
#[must_use]
pub fn rotation_yield(
    treatment: Treatment,
    primary_yield_per_ha: f64,
    secondary_yield_per_ha: f64,
    primary_price: f64,
    secondary_price: f64,
    area_ha: f64,
    study: &StudyParameters,
) -> RotationYield {
    rotation_with_impact(
        treatment,
        primary_yield_per_ha,
        secondary_yield_per_ha,
        primary_price,
        secondary_price,
        area_ha,
        study.yield_impact_pct,
    )
}

fn rotation_with_impact(
    treatment: Treatment,
    primary_yield_per_ha: f64,
    secondary_yield_per_ha: f64,
    primary_price: f64,
    secondary_price: f64,
    area_ha: f64,
    yield_impact_pct: f64,
) -> RotationYield {
    let area_ha = finite_or_zero(area_ha);
    let primary = yield_with_impact(treatment, primary_yield_per_ha, area_ha, yield_impact_pct);
    let secondary =
        yield_with_impact(treatment, secondary_yield_per_ha, area_ha, yield_impact_pct);
    let value_per_ha = finite_or_zero(
        primary.per_ha * primary_price + secondary.per_ha * secondary_price,
    );
    RotationYield {
        primary,
        secondary,
        combined: AreaAmount::from_per_ha(primary.per_ha + secondary.per_ha, area_ha),
        value: AreaAmount::from_per_ha(value_per_ha, area_ha),
    }
}

/// Carbon-credit revenue; a non-finite or non-positive FX rate counts as 1
#[must_use]
pub fn carbon_revenue(co2e_reduction: f64, carbon_price: f64, fx_rate: f64) -> CarbonRevenue {
    let fx = if fx_rate.is_finite() && fx_rate > 0.0 {
        fx_rate
    } else {
        1.0
    };
    let foreign = finite_or_zero(co2e_reduction * carbon_price);
    CarbonRevenue {
        local: foreign * fx,
        foreign,
    }
}

/// The parameters the uncertainty engines perturb, flattened so a trial or
/// design row can be evaluated without rebuilding inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPoint {
    pub conventional_emission: f64,
    pub treatment_emission: f64,
    pub area_unit: AreaUnit,
    pub yield_impact_pct: f64,
    pub carbon_price: f64,
    pub fx_rate: f64,
    pub price_conventional: f64,
    pub price_treatment: f64,
    pub n_content_conventional: f64,
    pub n_content_treatment: f64,
    pub dosage_kg_n_per_ha: f64,
    pub base_yield: f64,
    pub product_price: f64,
    pub secondary_yield: f64,
    pub secondary_price: f64,
}

impl ModelPoint {
    #[must_use]
    pub fn baseline(study: &StudyParameters, inputs: &SimulationInputs) -> Self {
        Self {
            conventional_emission: study.conventional_emission,
            treatment_emission: study.treatment_emission,
            area_unit: study.area_unit,
            yield_impact_pct: study.yield_impact_pct,
            carbon_price: inputs.carbon_price,
            fx_rate: inputs.fx_rate,
            price_conventional: inputs.price_conventional,
            price_treatment: inputs.price_treatment,
            n_content_conventional: inputs.n_content_conventional,
            n_content_treatment: inputs.n_content_treatment,
            dosage_kg_n_per_ha: inputs.dosage_kg_n_per_ha,
            base_yield: inputs.base_yield,
            product_price: inputs.product_price,
            secondary_yield: inputs.secondary_yield,
            secondary_price: inputs.secondary_price,
        }
    }

    #[must_use]
    pub fn emission_delta_per_ha(&self) -> f64 {
        delta_per_ha(
            self.conventional_emission,
            self.treatment_emission,
            self.area_unit,
        )
    }

    fn cost(&self, treatment: Treatment, area_ha: f64) -> AreaAmount {
        fertilizer_cost(
            treatment,
            area_ha,
            self.price_conventional,
            self.price_treatment,
            self.dosage_kg_n_per_ha,
            self.n_content_conventional,
            self.n_content_treatment,
        )
    }

    fn production(&self, treatment: Treatment, area_ha: f64) -> RotationYield {
        rotation_with_impact(
            treatment,
            self.base_yield,
            self.secondary_yield,
            self.product_price,
            self.secondary_price,
            area_ha,
            self.yield_impact_pct,
        )
    }

    /// Full model output for an area
    #[must_use]
    pub fn evaluate(&self, area_ha: f64) -> DeterministicResult {
        let delta = self.emission_delta_per_ha();
        let reduction = emission_to_co2e(delta, area_ha);
        let cost_conventional = self.cost(Treatment::Conventional, area_ha);
        let cost_treatment = self.cost(Treatment::ControlledRelease, area_ha);
        let yield_conventional = self.production(Treatment::Conventional, area_ha);
        let yield_treatment = self.production(Treatment::ControlledRelease, area_ha);
        let revenue_per_ha = carbon_revenue(reduction.per_ha, self.carbon_price, self.fx_rate);
        let revenue_total = carbon_revenue(reduction.total, self.carbon_price, self.fx_rate);

        let incremental_cost_per_ha = cost_treatment.per_ha - cost_conventional.per_ha;
        let yield_benefit_per_ha = yield_treatment.value.per_ha - yield_conventional.value.per_ha;

        DeterministicResult {
            emission_delta_kg_n_per_ha: delta,
            emission_reduction: reduction,
            cost_conventional,
            cost_treatment,
            yield_conventional,
            yield_treatment,
            carbon_revenue_per_ha: revenue_per_ha,
            carbon_revenue_total: revenue_total,
            incremental_cost_per_ha,
            yield_benefit_per_ha,
            net_annual_flow_per_ha: finite_or_zero(
                revenue_per_ha.local + yield_benefit_per_ha - incremental_cost_per_ha,
            ),
        }
    }

    /// Net annual flow per hectare (revenue + yield benefit - incremental cost)
    #[must_use]
    pub fn net_annual_flow_per_ha(&self) -> f64 {
        self.evaluate(1.0).net_annual_flow_per_ha
    }
}

/// Evaluate the deterministic model for a study and input set
#[must_use]
pub fn evaluate(study: &StudyParameters, inputs: &SimulationInputs) -> DeterministicResult {
    ModelPoint::baseline(study, inputs).evaluate(inputs.area_ha)
}

/// Carbon price (foreign currency per t-CO2e) at which the annual net flow
/// is zero.
///
/// Returns [`BreakEvenPrice::NotApplicable`] when the treatment does not
/// reduce emissions. When yield gains already cover the extra cost the
/// break-even price is 0.
#[must_use]
pub fn break_even_carbon_price(result: &DeterministicResult, fx_rate: f64) -> BreakEvenPrice {
    let reduction = result.emission_reduction.per_ha;
    if !(reduction.is_finite() && reduction > 0.0) {
        return BreakEvenPrice::NotApplicable;
    }
    let fx = if fx_rate.is_finite() && fx_rate > 0.0 {
        fx_rate
    } else {
        1.0
    };
    let shortfall = result.incremental_cost_per_ha - result.yield_benefit_per_ha;
    let price = shortfall / (reduction * fx);
    if price.is_finite() {
        BreakEvenPrice::Price(price.max(0.0))
    } else {
        BreakEvenPrice::NotApplicable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emission_to_co2e_reference_study() {
        let co2e = emission_to_co2e(0.118, 100.0);
        assert!((co2e.per_ha - 0.0506).abs() < 1e-4, "per ha {}", co2e.per_ha);
        assert!((co2e.total - 5.06).abs() < 1e-2, "total {}", co2e.total);
    }

    #[test]
    fn test_emission_increase_is_negative() {
        let co2e = emission_to_co2e(-0.5, 10.0);
        assert!(co2e.per_ha < 0.0);
        assert!((co2e.total - co2e.per_ha * 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_fertilizer_cost_reference_prices() {
        let conv = fertilizer_cost(Treatment::Conventional, 1.0, 1500.0, 2500.0, 240.0, 0.46, 0.42);
        let crf = fertilizer_cost(
            Treatment::ControlledRelease,
            1.0,
            1500.0,
            2500.0,
            240.0,
            0.46,
            0.42,
        );
        assert!((conv.per_ha - 782.6).abs() < 0.05, "conventional {}", conv.per_ha);
        assert!((crf.per_ha - 1428.6).abs() < 0.05, "treatment {}", crf.per_ha);
        assert!((crf.per_ha - conv.per_ha - 645.9).abs() < 0.05);
    }

    #[test]
    fn test_fertilizer_cost_zero_nitrogen_content() {
        let cost = fertilizer_cost(
            Treatment::ControlledRelease,
            100.0,
            1500.0,
            2500.0,
            240.0,
            0.46,
            0.0,
        );
        assert_eq!(cost, AreaAmount::default());
    }

    #[test]
    fn test_yield_result_uses_study_sign() {
        let ji = StudyParameters::lookup("ji_et_al").unwrap();
        let conv = yield_result(Treatment::Conventional, 7.0, 10.0, ji);
        let crf = yield_result(Treatment::ControlledRelease, 7.0, 10.0, ji);
        assert!((conv.per_ha - 7.0).abs() < 1e-12);
        assert!((crf.per_ha - 6.65).abs() < 1e-12);
        assert!((crf.total - 66.5).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_yield_applies_factor_to_both_crops() {
        let shakoor = StudyParameters::lookup("shakoor_et_al").unwrap();
        let crf = rotation_yield(
            Treatment::ControlledRelease,
            6.0,
            4.0,
            1500.0,
            1200.0,
            2.0,
            shakoor,
        );
        assert!((crf.primary.per_ha - 6.18).abs() < 1e-9);
        assert!((crf.secondary.per_ha - 4.12).abs() < 1e-9);
        assert!((crf.combined.total - 20.6).abs() < 1e-9);
        assert!((crf.value.per_ha - (6.18 * 1500.0 + 4.12 * 1200.0)).abs() < 1e-6);
    }

    #[test]
    fn test_carbon_revenue_fx_fallback() {
        let rev = carbon_revenue(2.0, 80.0, 5.0);
        assert_eq!(rev.foreign, 160.0);
        assert_eq!(rev.local, 800.0);

        let rev = carbon_revenue(2.0, 80.0, f64::NAN);
        assert_eq!(rev.local, rev.foreign);
    }

    #[test]
    fn test_break_even_not_applicable_without_reduction() {
        let result = DeterministicResult {
            incremental_cost_per_ha: 600.0,
            ..Default::default()
        };
        assert_eq!(
            break_even_carbon_price(&result, 6.0),
            BreakEvenPrice::NotApplicable
        );
    }

    #[test]
    fn test_break_even_zeroes_flow() {
        let study = StudyParameters::lookup("shakoor_et_al").unwrap();
        let inputs = SimulationInputs::for_study(study);
        let result = evaluate(study, &inputs);

        let BreakEvenPrice::Price(price) = break_even_carbon_price(&result, inputs.fx_rate) else {
            panic!("expected a break-even price");
        };
        let at_break_even = evaluate(study, &inputs.clone().with_market(price, inputs.fx_rate));
        if price > 0.0 {
            assert!(
                at_break_even.net_annual_flow_per_ha.abs() < 1e-6,
                "flow at break-even {}",
                at_break_even.net_annual_flow_per_ha
            );
        } else {
            assert!(at_break_even.net_annual_flow_per_ha >= 0.0);
        }
    }

    #[test]
    fn test_net_flow_matches_components() {
        let study = StudyParameters::lookup("ji_et_al").unwrap();
        let inputs = SimulationInputs::for_study(study);
        let result = evaluate(study, &inputs);
        let expected = result.carbon_revenue_per_ha.local + result.yield_benefit_per_ha
            - result.incremental_cost_per_ha;
        assert!((result.net_annual_flow_per_ha - expected).abs() < 1e-9);

        let point = ModelPoint::baseline(study, &inputs);
        assert!((point.net_annual_flow_per_ha() - expected).abs() < 1e-9);
    }
}

//! Tests for the carbon-price scenario comparator

use crate::evaluate::ModelPoint;
use crate::financial;
use crate::model::{STUDIES, SimulationInputs};
use crate::scenarios::{ScenarioConfig, compare_scenarios};

#[test]
fn test_npv_non_decreasing_in_multiplier() {
    for study in STUDIES {
        let base = ModelPoint::baseline(study, &SimulationInputs::for_study(study));
        let cmp = compare_scenarios(&base, &ScenarioConfig::default(), 10, 0.06);
        assert!(
            cmp.scenarios.windows(2).all(|w| w[1].npv >= w[0].npv),
            "{}: {:?}",
            study.id,
            cmp.scenarios
        );
    }
}

#[test]
fn test_first_scenario_matches_analyzer() {
    let study = &STUDIES[1];
    let inputs = SimulationInputs::for_study(study);
    let base = ModelPoint::baseline(study, &inputs);
    let cmp = compare_scenarios(&base, &ScenarioConfig::default(), 10, 0.06);

    let expected = financial::cash_flow_series(base.net_annual_flow_per_ha(), 10, 0.06).npv;
    let current = &cmp.scenarios[0];
    assert!((current.npv - expected).abs() < 1e-9);
    assert_eq!(current.carbon_price, inputs.carbon_price);
}

#[test]
fn test_viability_flag_follows_npv() {
    let study = &STUDIES[1];
    let base = ModelPoint::baseline(study, &SimulationInputs::for_study(study));
    let cmp = compare_scenarios(
        &base,
        &ScenarioConfig::from_multipliers(&[0.0, 1.0, 5.0, 20.0]),
        10,
        0.06,
    );
    for s in &cmp.scenarios {
        assert_eq!(s.viable, s.npv > 0.0, "{}", s.name);
    }
    // A 20x carbon price covers the incremental cost of the rotation study
    assert!(cmp.scenarios[3].viable);
    assert_eq!(cmp.viable_count(), cmp.scenarios.iter().filter(|s| s.npv > 0.0).count());
    assert_eq!(cmp.best().map(|s| s.multiplier), Some(20.0));
    assert_eq!(cmp.worst().map(|s| s.multiplier), Some(0.0));
}

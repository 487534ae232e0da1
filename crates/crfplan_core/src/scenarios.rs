//! Carbon-price scenario comparison
//!
//! Re-evaluates the deterministic model with the carbon price scaled by each
//! multiplier and analyzes NPV over the run's horizon.

use serde::{Deserialize, Serialize};

use crate::evaluate::ModelPoint;
use crate::financial;
use crate::model::{Scenario, ScenarioComparison};

/// A named carbon-price multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonScenario {
    pub name: String,
    pub multiplier: f64,
}

impl CarbonScenario {
    pub fn new(name: impl Into<String>, multiplier: f64) -> Self {
        Self {
            name: name.into(),
            multiplier,
        }
    }
}

fn default_scenarios() -> Vec<CarbonScenario> {
    vec![
        CarbonScenario::new("Current market", 1.0),
        CarbonScenario::new("Moderate tightening", 1.4),
        CarbonScenario::new("Strong tightening", 1.75),
        CarbonScenario::new("Paris-aligned", 2.3),
    ]
}

/// Ordered multipliers to compare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<CarbonScenario>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
        }
    }
}

impl ScenarioConfig {
    /// Unnamed scenarios labelled by their multiplier
    #[must_use]
    pub fn from_multipliers(multipliers: &[f64]) -> Self {
        Self {
            scenarios: multipliers
                .iter()
                .map(|&m| CarbonScenario::new(format!("{m}x"), m))
                .collect(),
        }
    }
}

/// NPV per scenario plus the first best and first worst.
///
/// Scenario NPV is non-decreasing in the multiplier whenever the treatment
/// reduces emissions.
#[must_use]
pub fn compare_scenarios(
    base: &ModelPoint,
    config: &ScenarioConfig,
    horizon_years: u32,
    discount_rate: f64,
) -> ScenarioComparison {
    let scenarios: Vec<Scenario> = config
        .scenarios
        .iter()
        .map(|scenario| {
            let mut point = *base;
            point.carbon_price = base.carbon_price * scenario.multiplier;
            let npv = financial::npv(point.net_annual_flow_per_ha(), horizon_years, discount_rate);
            Scenario {
                name: scenario.name.clone(),
                multiplier: scenario.multiplier,
                carbon_price: point.carbon_price,
                npv,
                viable: npv > 0.0,
            }
        })
        .collect();

    let mut best_index: Option<usize> = None;
    let mut worst_index: Option<usize> = None;
    for (i, s) in scenarios.iter().enumerate() {
        if best_index.is_none_or(|b| s.npv > scenarios[b].npv) {
            best_index = Some(i);
        }
        if worst_index.is_none_or(|w| s.npv < scenarios[w].npv) {
            worst_index = Some(i);
        }
    }

    ScenarioComparison {
        scenarios,
        best_index,
        worst_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SimulationInputs, StudyParameters};

    fn base() -> ModelPoint {
        let study = StudyParameters::lookup("shakoor_et_al").unwrap();
        ModelPoint::baseline(study, &SimulationInputs::for_study(study))
    }

    #[test]
    fn test_default_names_and_order() {
        let cmp = compare_scenarios(&base(), &ScenarioConfig::default(), 10, 0.06);
        let names: Vec<&str> = cmp.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Current market",
                "Moderate tightening",
                "Strong tightening",
                "Paris-aligned"
            ]
        );
        assert_eq!(cmp.best_index, Some(3));
        assert_eq!(cmp.worst_index, Some(0));
    }

    #[test]
    fn test_empty_list() {
        let cmp = compare_scenarios(&base(), &ScenarioConfig { scenarios: vec![] }, 10, 0.06);
        assert!(cmp.scenarios.is_empty());
        assert!(cmp.best().is_none());
        assert!(cmp.worst().is_none());
    }

    #[test]
    fn test_ties_pick_first() {
        let mut point = base();
        point.carbon_price = 0.0;
        let cmp = compare_scenarios(
            &point,
            &ScenarioConfig::from_multipliers(&[1.0, 2.0, 3.0]),
            5,
            0.06,
        );
        assert_eq!(cmp.best_index, Some(0));
        assert_eq!(cmp.worst_index, Some(0));
    }
}

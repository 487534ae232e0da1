use serde::{Deserialize, Serialize};

use crate::error::ProblemError;
use crate::evaluate::ModelPoint;
use crate::financial::{FIXED_DISCOUNT_RATE, FIXED_HORIZON_YEARS};

use super::sequence::MAX_DIMENSIONS;

/// Most parameters a problem may hold; the design needs two sequence
/// dimensions per parameter.
pub const MAX_PARAMETERS: usize = MAX_DIMENSIONS / 2;

/// Model quantity a Sobol parameter drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SobolTarget {
    ConventionalEmission,
    TreatmentEmission,
    CarbonPrice,
    PriceConventional,
    PriceTreatment,
    YieldImpact,
    FxRate,
    Dosage,
}

impl SobolTarget {
    /// Write `value` into the matching field of `point`
    pub fn apply(self, point: &mut ModelPoint, value: f64) {
        match self {
            SobolTarget::ConventionalEmission => point.conventional_emission = value,
            SobolTarget::TreatmentEmission => point.treatment_emission = value,
            SobolTarget::CarbonPrice => point.carbon_price = value,
            SobolTarget::PriceConventional => point.price_conventional = value,
            SobolTarget::PriceTreatment => point.price_treatment = value,
            SobolTarget::YieldImpact => point.yield_impact_pct = value,
            SobolTarget::FxRate => point.fx_rate = value,
            SobolTarget::Dosage => point.dosage_kg_n_per_ha = value,
        }
    }

    #[must_use]
    pub fn read(self, point: &ModelPoint) -> f64 {
        match self {
            SobolTarget::ConventionalEmission => point.conventional_emission,
            SobolTarget::TreatmentEmission => point.treatment_emission,
            SobolTarget::CarbonPrice => point.carbon_price,
            SobolTarget::PriceConventional => point.price_conventional,
            SobolTarget::PriceTreatment => point.price_treatment,
            SobolTarget::YieldImpact => point.yield_impact_pct,
            SobolTarget::FxRate => point.fx_rate,
            SobolTarget::Dosage => point.dosage_kg_n_per_ha,
        }
    }
}

/// One bounded input dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolParameter {
    pub name: String,
    pub target: SobolTarget,
    pub lower: f64,
    pub upper: f64,
}

impl SobolParameter {
    pub fn new(name: impl Into<String>, target: SobolTarget, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            target,
            lower,
            upper,
        }
    }

    /// Map a unit-interval coordinate into the bounds
    #[inline]
    #[must_use]
    pub fn scale(&self, unit: f64) -> f64 {
        self.lower + unit * (self.upper - self.lower)
    }
}

/// Ordered parameter space of a sensitivity run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolProblem {
    pub parameters: Vec<SobolParameter>,
}

impl SobolProblem {
    #[must_use]
    pub fn new(parameters: Vec<SobolParameter>) -> Self {
        Self { parameters }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn validate(&self) -> Result<(), ProblemError> {
        if self.parameters.is_empty() {
            return Err(ProblemError::NoParameters);
        }
        if self.parameters.len() > MAX_PARAMETERS {
            return Err(ProblemError::TooManyParameters {
                count: self.parameters.len(),
                max: MAX_PARAMETERS,
            });
        }
        for p in &self.parameters {
            if !(p.lower.is_finite() && p.upper.is_finite() && p.lower <= p.upper) {
                return Err(ProblemError::InvalidBounds {
                    name: p.name.clone(),
                    lower: p.lower,
                    upper: p.upper,
                });
            }
        }
        Ok(())
    }

    /// Default six-parameter problem around a baseline point
    ///
    /// | parameter | bounds |
    /// |-----------|--------|
    /// | emission rates | 0.7x to 1.3x |
    /// | carbon price | 0.5x to 2.5x |
    /// | fertilizer prices | 0.8x to 1.2x |
    /// | yield impact | ±5 percentage points |
    #[must_use]
    pub fn around_baseline(base: &ModelPoint) -> Self {
        let relative = |name: &str, target: SobolTarget, lo: f64, hi: f64| {
            let v = target.read(base).max(0.0);
            SobolParameter::new(name, target, v * lo, v * hi)
        };
        let impact = base.yield_impact_pct;
        Self::new(vec![
            relative(
                "conventional_emission",
                SobolTarget::ConventionalEmission,
                0.7,
                1.3,
            ),
            relative("treatment_emission", SobolTarget::TreatmentEmission, 0.7, 1.3),
            relative("carbon_price", SobolTarget::CarbonPrice, 0.5, 2.5),
            relative("price_conventional", SobolTarget::PriceConventional, 0.8, 1.2),
            relative("price_treatment", SobolTarget::PriceTreatment, 0.8, 1.2),
            SobolParameter::new(
                "yield_impact_pct",
                SobolTarget::YieldImpact,
                impact - 5.0,
                impact + 5.0,
            ),
        ])
    }
}

fn default_base_samples() -> usize {
    256
}

fn default_seed() -> u64 {
    42
}

fn default_resamples() -> usize {
    100
}

fn default_confidence_z() -> f64 {
    1.96
}

fn default_second_order() -> bool {
    true
}

fn default_horizon_years() -> u32 {
    FIXED_HORIZON_YEARS
}

fn default_discount_rate() -> f64 {
    FIXED_DISCOUNT_RATE
}

/// Configuration for Sobol runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolConfig {
    /// Base sample size N; the design has N * (2k + 2) rows
    #[serde(default = "default_base_samples")]
    pub base_samples: usize,
    /// Seed for bootstrap resampling
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Bootstrap resamples for confidence intervals (0 disables them)
    #[serde(default = "default_resamples")]
    pub resamples: usize,
    #[serde(default = "default_confidence_z")]
    pub confidence_z: f64,
    #[serde(default = "default_second_order")]
    pub second_order: bool,
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
}

impl Default for SobolConfig {
    fn default() -> Self {
        Self {
            base_samples: default_base_samples(),
            seed: default_seed(),
            resamples: default_resamples(),
            confidence_z: default_confidence_z(),
            second_order: default_second_order(),
            horizon_years: default_horizon_years(),
            discount_rate: default_discount_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SimulationInputs, StudyParameters};

    #[test]
    fn test_around_baseline_is_valid() {
        let study = StudyParameters::lookup("ji_et_al").unwrap();
        let base = ModelPoint::baseline(study, &SimulationInputs::for_study(study));
        let problem = SobolProblem::around_baseline(&base);
        assert_eq!(problem.len(), 6);
        assert!(problem.validate().is_ok());

        let carbon = &problem.parameters[2];
        assert_eq!(carbon.target, SobolTarget::CarbonPrice);
        assert!((carbon.lower - 42.5).abs() < 1e-9);
        assert!((carbon.upper - 212.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let problem = SobolProblem::new(vec![SobolParameter::new(
            "x",
            SobolTarget::Dosage,
            2.0,
            1.0,
        )]);
        assert!(matches!(
            problem.validate(),
            Err(ProblemError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_problem() {
        let params = (0..MAX_PARAMETERS + 1)
            .map(|i| SobolParameter::new(format!("p{i}"), SobolTarget::Dosage, 0.0, 1.0))
            .collect();
        assert!(matches!(
            SobolProblem::new(params).validate(),
            Err(ProblemError::TooManyParameters { count: 17, max: 16 })
        ));
    }
}

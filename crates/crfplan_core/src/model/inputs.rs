//! Per-run simulation inputs
//!
//! `SimulationInputs` is built once per request and never mutated during a
//! run. Invalid values are not rejected: [`SimulationInputs::sanitized`]
//! replaces them with the documented defaults below and reports each
//! substitution as an [`InputWarning`].

use serde::{Deserialize, Serialize};

use super::studies::StudyParameters;

/// Which fertilizer a computation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Treatment {
    /// Conventional fast-release urea
    Conventional,
    /// Controlled-release fertilizer
    ControlledRelease,
}

pub const DEFAULT_AREA_HA: f64 = 100.0;
pub const DEFAULT_HORIZON_YEARS: u32 = 10;
/// Longest analysis horizon accepted
pub const MAX_HORIZON_YEARS: u32 = 100;
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.06;
pub const DEFAULT_DOSAGE_KG_N_PER_HA: f64 = 240.0;
pub const DEFAULT_PRICE_CONVENTIONAL: f64 = 1500.0;
pub const DEFAULT_PRICE_TREATMENT: f64 = 2500.0;
/// Urea
pub const DEFAULT_N_CONTENT_CONVENTIONAL: f64 = 0.46;
pub const DEFAULT_N_CONTENT_TREATMENT: f64 = 0.42;
/// Reference carbon price in foreign currency per t-CO2e
pub const DEFAULT_CARBON_PRICE: f64 = 85.0;
/// Local currency per unit of foreign currency
pub const DEFAULT_FX_RATE: f64 = 6.0;

fn default_area_ha() -> f64 {
    DEFAULT_AREA_HA
}

fn default_horizon_years() -> u32 {
    DEFAULT_HORIZON_YEARS
}

fn default_discount_rate() -> f64 {
    DEFAULT_DISCOUNT_RATE
}

fn default_base_yield() -> f64 {
    super::studies::default_study().primary_crop.yield_per_ha
}

fn default_product_price() -> f64 {
    super::studies::default_study().primary_crop.reference_price
}

fn default_price_conventional() -> f64 {
    DEFAULT_PRICE_CONVENTIONAL
}

fn default_price_treatment() -> f64 {
    DEFAULT_PRICE_TREATMENT
}

fn default_n_content_conventional() -> f64 {
    DEFAULT_N_CONTENT_CONVENTIONAL
}

fn default_n_content_treatment() -> f64 {
    DEFAULT_N_CONTENT_TREATMENT
}

fn default_dosage() -> f64 {
    DEFAULT_DOSAGE_KG_N_PER_HA
}

fn default_carbon_price() -> f64 {
    DEFAULT_CARBON_PRICE
}

fn default_fx_rate() -> f64 {
    DEFAULT_FX_RATE
}

/// Inputs for a single simulation request
///
/// Prices are per tonne of product; `carbon_price` is quoted in the foreign
/// currency and converted with `fx_rate` (local per foreign).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    /// Cultivated area (ha)
    #[serde(default = "default_area_ha")]
    pub area_ha: f64,
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,
    /// Annual discount rate as a fraction
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
    /// Conventional yield of the primary crop (t/ha)
    #[serde(default = "default_base_yield")]
    pub base_yield: f64,
    /// Primary crop price (currency/t)
    #[serde(default = "default_product_price")]
    pub product_price: f64,
    /// Conventional yield of the rotation's second crop (t/ha)
    #[serde(default)]
    pub secondary_yield: f64,
    #[serde(default)]
    pub secondary_price: f64,
    /// Conventional fertilizer price (currency/t of product)
    #[serde(default = "default_price_conventional")]
    pub price_conventional: f64,
    /// Treatment fertilizer price (currency/t of product)
    #[serde(default = "default_price_treatment")]
    pub price_treatment: f64,
    /// Nitrogen mass fraction of the conventional fertilizer
    #[serde(default = "default_n_content_conventional")]
    pub n_content_conventional: f64,
    #[serde(default = "default_n_content_treatment")]
    pub n_content_treatment: f64,
    /// Applied nitrogen (kg N/ha)
    #[serde(default = "default_dosage")]
    pub dosage_kg_n_per_ha: f64,
    /// Foreign currency per t-CO2e
    #[serde(default = "default_carbon_price")]
    pub carbon_price: f64,
    #[serde(default = "default_fx_rate")]
    pub fx_rate: f64,
}

impl Default for SimulationInputs {
    fn default() -> Self {
        Self {
            area_ha: default_area_ha(),
            horizon_years: default_horizon_years(),
            discount_rate: default_discount_rate(),
            base_yield: default_base_yield(),
            product_price: default_product_price(),
            secondary_yield: 0.0,
            secondary_price: 0.0,
            price_conventional: default_price_conventional(),
            price_treatment: default_price_treatment(),
            n_content_conventional: default_n_content_conventional(),
            n_content_treatment: default_n_content_treatment(),
            dosage_kg_n_per_ha: default_dosage(),
            carbon_price: default_carbon_price(),
            fx_rate: default_fx_rate(),
        }
    }
}

/// A field that was replaced by its default during sanitizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputWarning {
    pub field: String,
    pub provided: f64,
    pub substituted: f64,
}

impl SimulationInputs {
    /// Inputs seeded with a study's crop baselines
    #[must_use]
    pub fn for_study(study: &StudyParameters) -> Self {
        let (secondary_yield, secondary_price) = study
            .secondary_crop
            .map(|c| (c.yield_per_ha, c.reference_price))
            .unwrap_or((0.0, 0.0));
        Self {
            base_yield: study.primary_crop.yield_per_ha,
            product_price: study.primary_crop.reference_price,
            secondary_yield,
            secondary_price,
            ..Self::default()
        }
    }

    /// Replace carbon price and FX rate, e.g. with a provider's quotes
    #[must_use]
    pub fn with_market(mut self, carbon_price: f64, fx_rate: f64) -> Self {
        self.carbon_price = carbon_price;
        self.fx_rate = fx_rate;
        self
    }

    /// Nitrogen fraction of the given treatment
    #[must_use]
    pub fn n_content(&self, treatment: Treatment) -> f64 {
        match treatment {
            Treatment::Conventional => self.n_content_conventional,
            Treatment::ControlledRelease => self.n_content_treatment,
        }
    }

    /// Fertilizer price of the given treatment
    #[must_use]
    pub fn fertilizer_price(&self, treatment: Treatment) -> f64 {
        match treatment {
            Treatment::Conventional => self.price_conventional,
            Treatment::ControlledRelease => self.price_treatment,
        }
    }

    /// Copy of these inputs with every out-of-range field replaced by its
    /// default, plus one warning per replacement.
    ///
    /// | field | valid | default |
    /// |-------|-------|---------|
    /// | `area_ha` | finite, > 0 | 100 |
    /// | `horizon_years` | 1 to 100 | 10 (100 when too long) |
    /// | `discount_rate` | finite, in [0, 1) | 0.06 |
    /// | yields, product prices | finite, ≥ 0 | 0 |
    /// | fertilizer prices | finite, ≥ 0 | 1500 / 2500 |
    /// | nitrogen fractions | finite, in (0, 1] | 0.46 / 0.42 |
    /// | dosage | finite, ≥ 0 | 240 |
    /// | carbon price | finite, ≥ 0 | 85 |
    /// | FX rate | finite, > 0 | 6.0 |
    #[must_use]
    pub fn sanitized(&self) -> (Self, Vec<InputWarning>) {
        let mut out = self.clone();
        let mut warnings = Vec::new();

        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        let fraction = |v: f64| v.is_finite() && v > 0.0 && v <= 1.0;

        fix(&mut out.area_ha, "area_ha", positive, DEFAULT_AREA_HA, &mut warnings);
        if out.horizon_years == 0 {
            warnings.push(InputWarning {
                field: "horizon_years".to_string(),
                provided: 0.0,
                substituted: f64::from(DEFAULT_HORIZON_YEARS),
            });
            out.horizon_years = DEFAULT_HORIZON_YEARS;
        } else if out.horizon_years > MAX_HORIZON_YEARS {
            warnings.push(InputWarning {
                field: "horizon_years".to_string(),
                provided: f64::from(out.horizon_years),
                substituted: f64::from(MAX_HORIZON_YEARS),
            });
            out.horizon_years = MAX_HORIZON_YEARS;
        }
        fix(
            &mut out.discount_rate,
            "discount_rate",
            |v| v.is_finite() && (0.0..1.0).contains(&v),
            DEFAULT_DISCOUNT_RATE,
            &mut warnings,
        );
        fix(&mut out.base_yield, "base_yield", non_negative, 0.0, &mut warnings);
        fix(&mut out.product_price, "product_price", non_negative, 0.0, &mut warnings);
        fix(&mut out.secondary_yield, "secondary_yield", non_negative, 0.0, &mut warnings);
        fix(&mut out.secondary_price, "secondary_price", non_negative, 0.0, &mut warnings);
        fix(
            &mut out.price_conventional,
            "price_conventional",
            non_negative,
            DEFAULT_PRICE_CONVENTIONAL,
            &mut warnings,
        );
        fix(
            &mut out.price_treatment,
            "price_treatment",
            non_negative,
            DEFAULT_PRICE_TREATMENT,
            &mut warnings,
        );
        fix(
            &mut out.n_content_conventional,
            "n_content_conventional",
            fraction,
            DEFAULT_N_CONTENT_CONVENTIONAL,
            &mut warnings,
        );
        fix(
            &mut out.n_content_treatment,
            "n_content_treatment",
            fraction,
            DEFAULT_N_CONTENT_TREATMENT,
            &mut warnings,
        );
        fix(
            &mut out.dosage_kg_n_per_ha,
            "dosage_kg_n_per_ha",
            non_negative,
            DEFAULT_DOSAGE_KG_N_PER_HA,
            &mut warnings,
        );
        fix(
            &mut out.carbon_price,
            "carbon_price",
            non_negative,
            DEFAULT_CARBON_PRICE,
            &mut warnings,
        );
        fix(&mut out.fx_rate, "fx_rate", positive, DEFAULT_FX_RATE, &mut warnings);

        for w in &warnings {
            tracing::warn!(
                field = %w.field,
                provided = w.provided,
                substituted = w.substituted,
                "invalid simulation input replaced by default"
            );
        }

        (out, warnings)
    }
}

fn fix(
    value: &mut f64,
    field: &str,
    valid: impl Fn(f64) -> bool,
    default: f64,
    warnings: &mut Vec<InputWarning>,
) {
    if !valid(*value) {
        warnings.push(InputWarning {
            field: field.to_string(),
            provided: *value,
            substituted: default,
        });
        *value = default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StudyParameters;

    #[test]
    fn test_valid_inputs_pass_through() {
        let inputs = SimulationInputs::default();
        let (clean, warnings) = inputs.sanitized();
        assert!(warnings.is_empty());
        assert_eq!(clean, inputs);
    }

    #[test]
    fn test_invalid_fields_take_defaults() {
        let inputs = SimulationInputs {
            area_ha: -5.0,
            horizon_years: 0,
            discount_rate: f64::NAN,
            n_content_treatment: 0.0,
            fx_rate: 0.0,
            ..Default::default()
        };
        let (clean, warnings) = inputs.sanitized();

        assert_eq!(clean.area_ha, DEFAULT_AREA_HA);
        assert_eq!(clean.horizon_years, DEFAULT_HORIZON_YEARS);
        assert_eq!(clean.discount_rate, DEFAULT_DISCOUNT_RATE);
        assert_eq!(clean.n_content_treatment, DEFAULT_N_CONTENT_TREATMENT);
        assert_eq!(clean.fx_rate, DEFAULT_FX_RATE);

        let fields: Vec<&str> = warnings.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "area_ha",
                "horizon_years",
                "discount_rate",
                "n_content_treatment",
                "fx_rate"
            ]
        );
    }

    #[test]
    fn test_long_horizon_is_capped() {
        let inputs = SimulationInputs {
            horizon_years: u32::MAX,
            ..Default::default()
        };
        let (clean, warnings) = inputs.sanitized();
        assert_eq!(clean.horizon_years, MAX_HORIZON_YEARS);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "horizon_years");
        assert_eq!(warnings[0].provided, f64::from(u32::MAX));
        assert_eq!(warnings[0].substituted, 100.0);

        let at_cap = SimulationInputs {
            horizon_years: MAX_HORIZON_YEARS,
            ..Default::default()
        };
        assert!(at_cap.sanitized().1.is_empty());
    }

    #[test]
    fn test_for_study_fills_rotation_crop() {
        let shakoor = StudyParameters::lookup("shakoor_et_al").unwrap();
        let inputs = SimulationInputs::for_study(shakoor);
        assert_eq!(inputs.base_yield, 6.0);
        assert_eq!(inputs.secondary_yield, 4.0);
        assert_eq!(inputs.secondary_price, 1200.0);

        let ji = StudyParameters::lookup("ji_et_al").unwrap();
        let inputs = SimulationInputs::for_study(ji);
        assert_eq!(inputs.secondary_yield, 0.0);
    }
}

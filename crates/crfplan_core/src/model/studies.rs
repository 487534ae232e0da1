//! Reference study registry
//!
//! Literature values for N2O emissions under conventional urea and a
//! controlled-release fertilizer (CRF). The table is static and read-only for
//! the lifetime of the process.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Unit in which a study reports its emission rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaUnit {
    /// mg N per square metre
    SquareMeter,
    /// kg N per hectare
    Hectare,
}

impl AreaUnit {
    /// Factor converting this unit's emission rate into kg N/ha
    #[must_use]
    pub fn to_kg_per_ha(self) -> f64 {
        match self {
            AreaUnit::SquareMeter => 0.01,
            AreaUnit::Hectare => 1.0,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::SquareMeter => "m²",
            AreaUnit::Hectare => "ha",
        }
    }
}

/// Baseline agronomy for a crop in a study
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropBaseline {
    pub name: &'static str,
    /// t/ha under conventional fertilizer
    pub yield_per_ha: f64,
    /// currency/t
    pub reference_price: f64,
}

/// Immutable parameters of one reference study
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyParameters {
    pub id: &'static str,
    pub name: &'static str,
    /// Emission rate under conventional fertilizer, in `area_unit`
    pub conventional_emission: f64,
    /// Emission rate under the treatment fertilizer, in `area_unit`
    pub treatment_emission: f64,
    pub area_unit: AreaUnit,
    /// Emission reduction reported by the authors (%)
    pub reported_reduction_pct: f64,
    /// Signed yield change of the treatment relative to conventional (%)
    pub yield_impact_pct: f64,
    pub crop: &'static str,
    pub system: &'static str,
    pub primary_crop: CropBaseline,
    /// Second crop of a rotation system
    pub secondary_crop: Option<CropBaseline>,
}

impl StudyParameters {
    /// Look up a study by identifier
    pub fn lookup(id: &str) -> Result<&'static StudyParameters, SimulationError> {
        STUDIES
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| SimulationError::UnknownStudy(id.to_string()))
    }

    /// Emission delta (conventional minus treatment) in kg N/ha
    #[must_use]
    pub fn emission_delta_per_ha(&self) -> f64 {
        delta_per_ha(
            self.conventional_emission,
            self.treatment_emission,
            self.area_unit,
        )
    }

    /// Whether the study covers a two-crop rotation
    #[must_use]
    pub fn is_rotation(&self) -> bool {
        self.secondary_crop.is_some()
    }

    /// Multiplier applied to conventional yields under the treatment
    #[must_use]
    pub fn treatment_yield_factor(&self) -> f64 {
        yield_factor(self.yield_impact_pct)
    }
}

/// Emission delta for arbitrary rates expressed in `unit`
#[must_use]
pub fn delta_per_ha(conventional: f64, treatment: f64, unit: AreaUnit) -> f64 {
    (conventional - treatment) * unit.to_kg_per_ha()
}

#[must_use]
pub fn yield_factor(yield_impact_pct: f64) -> f64 {
    1.0 + yield_impact_pct / 100.0
}

/// All reference studies, in display order
pub static STUDIES: &[StudyParameters] = &[
    StudyParameters {
        id: "ji_et_al",
        name: "Ji et al. (2013) - Rice system",
        conventional_emission: 81.4,
        treatment_emission: 69.6,
        area_unit: AreaUnit::SquareMeter,
        reported_reduction_pct: 14.5,
        yield_impact_pct: -5.0,
        crop: "Rice",
        system: "Monoculture",
        primary_crop: CropBaseline {
            name: "Rice",
            yield_per_ha: 7.0,
            reference_price: 1500.0,
        },
        secondary_crop: None,
    },
    StudyParameters {
        id: "shakoor_et_al",
        name: "Shakoor et al. (2018) - Rice-wheat system",
        conventional_emission: 2.86,
        treatment_emission: 2.10,
        area_unit: AreaUnit::Hectare,
        reported_reduction_pct: 26.5,
        yield_impact_pct: 3.0,
        crop: "Rice-Wheat",
        system: "Rotation",
        primary_crop: CropBaseline {
            name: "Rice",
            yield_per_ha: 6.0,
            reference_price: 1500.0,
        },
        secondary_crop: Some(CropBaseline {
            name: "Wheat",
            yield_per_ha: 4.0,
            reference_price: 1200.0,
        }),
    },
];

/// The study used when none is selected
pub fn default_study() -> &'static StudyParameters {
    &STUDIES[0]
}

//! Fertilizer-switch viability simulation library
//!
//! This crate evaluates switching from conventional urea to a
//! controlled-release fertilizer under uncertain market and biophysical
//! parameters. It provides:
//! - A static registry of reference field studies
//! - A deterministic emission, cost, yield and carbon-revenue model
//! - Discounted cash-flow analysis (NPV, payback, break-even carbon price)
//! - Monte Carlo uncertainty propagation with reproducible seeding
//! - Sobol global sensitivity analysis over a Saltelli design
//! - Carbon-price scenario comparison
//!
//! # Example
//!
//! ```ignore
//! use crfplan_core::{
//!     AnalysisOptions, PriceProvenance, SimulationInputs, StudyParameters, simulate,
//! };
//!
//! let study = StudyParameters::lookup("ji_et_al")?;
//! let inputs = SimulationInputs::for_study(study);
//! let options = AnalysisOptions::default();
//! let report = simulate(study, &inputs, &options, PriceProvenance::default(), None)?;
//! println!("NPV per ha: {:.0}", report.cash_flows.npv);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod evaluate;
pub mod financial;
pub mod monte_carlo;
pub mod progress;
pub mod scenarios;
pub mod sensitivity;
pub mod simulation;
pub mod stats;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use error::{ProblemError, SimulationError};
pub use model::{PriceProvenance, SimulationInputs, SimulationReport, StudyParameters};
pub use progress::RunProgress;
pub use simulation::{AnalysisOptions, simulate};

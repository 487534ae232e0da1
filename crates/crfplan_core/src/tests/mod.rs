//! Integration tests for the crfplan simulation engine
//!
//! Tests are organized by topic:
//! - `deterministic` - Reference values of the emission, cost and yield model
//! - `financial` - Cash-flow series, NPV and payback properties
//! - `monte_carlo` - Seeding, batching, summary statistics and cancellation
//! - `sobol` - Index estimators on analytic models and on the NPV model
//! - `scenarios` - Carbon-price multiplier comparison
//! - `simulation` - Full single-invocation reports

mod financial;
mod scenarios;

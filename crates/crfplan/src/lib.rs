//! Command-line driver for the crfplan simulation engine
//!
//! Loads a YAML run file, resolves market quotes through a guarded and
//! cached price board, runs [`crfplan_core::simulate`] and writes the report
//! as JSON or YAML.

pub mod config;
pub mod logging;
pub mod prices;
pub mod report;
pub mod runner;

pub use config::{ConfigError, OutputFormat, Overrides, RunConfig};
pub use logging::init_logging;
pub use runner::execute;

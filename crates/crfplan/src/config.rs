//! Run configuration
//!
//! A run is described by a YAML file (all sections optional) and then
//! adjusted by command-line overrides:
//!
//! ```yaml
//! study: shakoor_et_al
//! inputs:
//!   area_ha: 40
//!   horizon_years: 8
//! analysis:
//!   monte_carlo:
//!     trials: 5000
//!     seed: 7
//!   sobol:
//!     base_samples: 512
//! prices:
//!   carbon_price: 92
//!   timeout_secs: 12
//! output: yaml
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use crfplan_core::AnalysisOptions;
use crfplan_core::model::{SimulationInputs, StudyParameters, default_study};
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::prices::{BoardSettings, MAX_TIMEOUT, MIN_TIMEOUT, MarketOrigin};

/// Error types for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// Parse error (invalid YAML)
    Parse(String),
    /// Serialization error
    Serialize(String),
    /// The configured study is not in the registry
    UnknownStudy(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::Serialize(msg) => write!(f, "Serialization error: {}", msg),
            ConfigError::UnknownStudy(id) => write!(f, "Unknown study: {}", id),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How the report is written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Per-field overrides of the study's baseline inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputOverrides {
    pub area_ha: Option<f64>,
    pub horizon_years: Option<u32>,
    pub discount_rate: Option<f64>,
    pub base_yield: Option<f64>,
    pub product_price: Option<f64>,
    pub secondary_yield: Option<f64>,
    pub secondary_price: Option<f64>,
    pub price_conventional: Option<f64>,
    pub price_treatment: Option<f64>,
    pub n_content_conventional: Option<f64>,
    pub n_content_treatment: Option<f64>,
    pub dosage_kg_n_per_ha: Option<f64>,
}

impl InputOverrides {
    /// Study baseline inputs with every set override applied
    #[must_use]
    pub fn apply(&self, study: &StudyParameters) -> SimulationInputs {
        let mut inputs = SimulationInputs::for_study(study);
        let set = |slot: &mut f64, v: Option<f64>| {
            if let Some(v) = v {
                *slot = v;
            }
        };
        set(&mut inputs.area_ha, self.area_ha);
        if let Some(h) = self.horizon_years {
            inputs.horizon_years = h;
        }
        set(&mut inputs.discount_rate, self.discount_rate);
        set(&mut inputs.base_yield, self.base_yield);
        set(&mut inputs.product_price, self.product_price);
        set(&mut inputs.secondary_yield, self.secondary_yield);
        set(&mut inputs.secondary_price, self.secondary_price);
        set(&mut inputs.price_conventional, self.price_conventional);
        set(&mut inputs.price_treatment, self.price_treatment);
        set(&mut inputs.n_content_conventional, self.n_content_conventional);
        set(&mut inputs.n_content_treatment, self.n_content_treatment);
        set(&mut inputs.dosage_kg_n_per_ha, self.dosage_kg_n_per_ha);
        inputs
    }
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

/// Market values and provider limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSettings {
    /// Foreign currency per t-CO2e; the reference value is used when unset
    #[serde(default)]
    pub carbon_price: Option<f64>,
    #[serde(default)]
    pub fx_rate: Option<f64>,
    #[serde(default)]
    pub rice_price: Option<f64>,
    #[serde(default)]
    pub wheat_price: Option<f64>,
    /// Clamped to 10..=15
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            carbon_price: None,
            fx_rate: None,
            rice_price: None,
            wheat_price: None,
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl PriceSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs).clamp(MIN_TIMEOUT, MAX_TIMEOUT)
    }

    #[must_use]
    pub fn board_settings(&self, origin: MarketOrigin) -> BoardSettings {
        BoardSettings {
            carbon_price: self.carbon_price,
            fx_rate: self.fx_rate,
            rice_price: self.rice_price,
            wheat_price: self.wheat_price,
            origin,
            timeout: self.timeout(),
            ttl: SignedDuration::from_secs(i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX)),
        }
    }
}

fn default_study_id() -> String {
    default_study().id.to_string()
}

/// Everything needed for one `crfplan run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_study_id")]
    pub study: String,
    #[serde(default)]
    pub inputs: InputOverrides,
    #[serde(default)]
    pub analysis: AnalysisOptions,
    #[serde(default)]
    pub prices: PriceSettings,
    #[serde(default)]
    pub output: OutputFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            study: default_study_id(),
            inputs: InputOverrides::default(),
            analysis: AnalysisOptions::default(),
            prices: PriceSettings::default(),
            output: OutputFormat::default(),
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub study: Option<String>,
    pub trials: Option<usize>,
    pub seed: Option<u64>,
    pub sobol_samples: Option<usize>,
    pub skip_sensitivity: bool,
    pub carbon_price: Option<f64>,
    pub fx_rate: Option<f64>,
    pub output: Option<OutputFormat>,
}

impl RunConfig {
    /// Load a run file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse run config: {}", e)))
    }

    /// Write this configuration as YAML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_saphyr::to_string(self)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Io(format!("Failed to create directory: {}", e)))?;
        }
        fs::write(path, yaml).map_err(|e| ConfigError::Io(format!("Failed to write config: {}", e)))
    }

    /// Apply command-line overrides; the returned origin marks which market
    /// values came from the command line
    pub fn apply(&mut self, overrides: &Overrides) -> MarketOrigin {
        if let Some(study) = &overrides.study {
            self.study = study.clone();
        }
        if let Some(trials) = overrides.trials {
            self.analysis.monte_carlo.trials = trials;
        }
        if let Some(seed) = overrides.seed {
            self.analysis.monte_carlo.seed = seed;
            self.analysis.sobol.seed = seed;
        }
        if let Some(n) = overrides.sobol_samples {
            self.analysis.sobol.base_samples = n;
        }
        if overrides.skip_sensitivity {
            self.analysis.run_sensitivity = false;
        }
        if let Some(format) = overrides.output {
            self.output = format;
        }
        let mut origin = MarketOrigin::default();
        if let Some(price) = overrides.carbon_price {
            self.prices.carbon_price = Some(price);
            origin.carbon_from_cli = true;
        }
        if let Some(fx) = overrides.fx_rate {
            self.prices.fx_rate = Some(fx);
            origin.fx_from_cli = true;
        }
        origin
    }

    /// The configured study
    pub fn resolve_study(&self) -> Result<&'static StudyParameters, ConfigError> {
        StudyParameters::lookup(&self.study)
            .map_err(|_| ConfigError::UnknownStudy(self.study.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_takes_defaults() {
        let config = RunConfig::parse("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.study, "ji_et_al");
    }

    #[test]
    fn test_partial_sections() {
        let yaml = "study: shakoor_et_al\n\
                    inputs:\n  area_ha: 40\n\
                    analysis:\n  monte_carlo:\n    trials: 250\n\
                    prices:\n  carbon_price: 92.5\n\
                    output: yaml\n";
        let config = RunConfig::parse(yaml).unwrap();
        assert_eq!(config.study, "shakoor_et_al");
        assert_eq!(config.inputs.area_ha, Some(40.0));
        assert_eq!(config.analysis.monte_carlo.trials, 250);
        assert_eq!(config.analysis.monte_carlo.seed, 42);
        assert_eq!(config.analysis.sobol.base_samples, 256);
        assert_eq!(config.prices.carbon_price, Some(92.5));
        assert_eq!(config.output, OutputFormat::Yaml);
    }

    #[test]
    fn test_overrides_fill_study_baseline() {
        let shakoor = StudyParameters::lookup("shakoor_et_al").unwrap();
        let overrides = InputOverrides {
            area_ha: Some(12.0),
            ..Default::default()
        };
        let inputs = overrides.apply(shakoor);
        assert_eq!(inputs.area_ha, 12.0);
        assert_eq!(inputs.secondary_yield, 4.0);
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let mut config = RunConfig::default();
        let origin = config.apply(&Overrides {
            study: Some("shakoor_et_al".to_string()),
            seed: Some(9),
            fx_rate: Some(7.1),
            skip_sensitivity: true,
            ..Default::default()
        });
        assert!(origin.fx_from_cli);
        assert!(!origin.carbon_from_cli);
        assert_eq!(config.study, "shakoor_et_al");
        assert_eq!(config.analysis.monte_carlo.seed, 9);
        assert_eq!(config.analysis.sobol.seed, 9);
        assert_eq!(config.prices.fx_rate, Some(7.1));
        assert!(!config.analysis.run_sensitivity);
    }

    #[test]
    fn test_market_origin_is_tracked_per_value() {
        let mut config = RunConfig::parse("prices:\n  fx_rate: 5.9\n").unwrap();
        let origin = config.apply(&Overrides {
            carbon_price: Some(130.0),
            ..Default::default()
        });
        assert_eq!(origin.carbon_label(), "cli");
        assert_eq!(origin.fx_label(), "config");

        let settings = config.prices.board_settings(origin);
        assert_eq!(settings.carbon_price, Some(130.0));
        assert_eq!(settings.fx_rate, Some(5.9));
        assert_eq!(settings.origin, origin);
    }

    #[test]
    fn test_timeout_is_clamped() {
        let mut prices = PriceSettings::default();
        assert_eq!(prices.timeout(), Duration::from_secs(12));
        prices.timeout_secs = 1;
        assert_eq!(prices.timeout(), MIN_TIMEOUT);
        prices.timeout_secs = 120;
        assert_eq!(prices.timeout(), MAX_TIMEOUT);
    }

    #[test]
    fn test_unknown_study() {
        let config = RunConfig {
            study: "smith_et_al".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_study(),
            Err(ConfigError::UnknownStudy(id)) if id == "smith_et_al"
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.yaml");
        let mut config = RunConfig::default();
        config.inputs.horizon_years = Some(8);
        config.prices.wheat_price = Some(1300.0);

        config.save(&path).unwrap();
        let loaded = RunConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

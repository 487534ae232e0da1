//! Report serialization for the presentation layer

use crfplan_core::SimulationReport;
use crfplan_core::model::BreakEvenPrice;
use jiff::Timestamp;
use serde::Serialize;

use crate::config::{ConfigError, OutputFormat};

/// Top-level document written to stdout
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput<'a> {
    pub generated_at: Timestamp,
    pub report: &'a SimulationReport,
}

impl<'a> RunOutput<'a> {
    pub fn new(report: &'a SimulationReport) -> Self {
        Self {
            generated_at: Timestamp::now(),
            report,
        }
    }
}

/// Serialize a report in the requested format
pub fn render(report: &SimulationReport, format: OutputFormat) -> Result<String, ConfigError> {
    let output = RunOutput::new(report);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&output)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize report: {}", e))),
        OutputFormat::Yaml => serde_saphyr::to_string(&output)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize report: {}", e))),
    }
}

/// One-line summary for the log
#[must_use]
pub fn summary_line(report: &SimulationReport) -> String {
    let break_even = match report.break_even_carbon_price {
        BreakEvenPrice::Price(p) => format!("{p:.2}"),
        BreakEvenPrice::NotApplicable => "n/a".to_string(),
    };
    format!(
        "study={} npv_per_ha={:.2} payback_year={} break_even={} p_viable={:.3} \
         viable_scenarios={}/{}",
        report.study_id,
        report.cash_flows.npv,
        report.cash_flows.payback_year,
        break_even,
        report.monte_carlo.probability_viable,
        report.scenarios.viable_count(),
        report.scenarios.scenarios.len()
    )
}

#[cfg(test)]
mod tests {
    use crfplan_core::model::{SimulationInputs, StudyParameters};
    use crfplan_core::monte_carlo::MonteCarloConfig;
    use crfplan_core::{AnalysisOptions, PriceProvenance, simulate};

    use super::*;

    fn small_report() -> SimulationReport {
        let study = StudyParameters::lookup("shakoor_et_al").unwrap();
        let options = AnalysisOptions {
            monte_carlo: MonteCarloConfig {
                trials: 50,
                ..Default::default()
            },
            run_sensitivity: false,
            ..Default::default()
        };
        simulate(
            study,
            &SimulationInputs::for_study(study),
            &options,
            PriceProvenance::default(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_json_output_has_report_sections() {
        let json = render(&small_report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report"]["study_id"], "shakoor_et_al");
        assert!(value["report"]["cash_flows"]["npv"].is_number());
        assert_eq!(value["report"]["monte_carlo"]["trials"], 50);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_yaml_output() {
        let yaml = render(&small_report(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("study_id: shakoor_et_al"));
    }

    #[test]
    fn test_summary_line() {
        let line = summary_line(&small_report());
        assert!(line.starts_with("study=shakoor_et_al"));
        assert!(line.contains("viable_scenarios="));
    }
}

//! Static listings: the detector bank and the scenario catalogue.

use serde::Serialize;
use tabled::Tabled;

use gridwatch_core::{Detector, FaultScenario, Metric, Severity};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, paint_severity};

// ── Detectors ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct DetectorInfo {
    fault_type: String,
    metric: Metric,
    unit: &'static str,
    rule: &'static str,
}

impl From<Detector> for DetectorInfo {
    fn from(d: Detector) -> Self {
        let metric = d.metric();
        Self {
            fault_type: d.fault_type().to_string(),
            metric,
            unit: metric.unit(),
            rule: d.rule(),
        }
    }
}

#[derive(Tabled)]
struct DetectorRow {
    #[tabled(rename = "Fault")]
    fault_type: String,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Rule")]
    rule: String,
}

pub fn detectors(global: &GlobalOpts) -> Result<(), CliError> {
    let infos: Vec<DetectorInfo> = Detector::ALL.into_iter().map(DetectorInfo::from).collect();
    let out = output::render_list(
        &global.output,
        &infos,
        |d| DetectorRow {
            fault_type: d.fault_type.clone(),
            metric: if d.unit.is_empty() {
                d.metric.to_string()
            } else {
                format!("{} ({})", d.metric, d.unit)
            },
            rule: d.rule.into(),
        },
        |d| d.fault_type.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Scenarios ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ScenarioInfo {
    scenario: FaultScenario,
    severity: Severity,
    duration_units: u32,
    overrides: Vec<String>,
}

impl From<FaultScenario> for ScenarioInfo {
    fn from(s: FaultScenario) -> Self {
        Self {
            scenario: s,
            severity: s.severity(),
            duration_units: s.duration_units(),
            overrides: s
                .overrides()
                .iter()
                .map(|r| format!("{} {}..{}", r.metric, r.low, r.high))
                .collect(),
        }
    }
}

#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Units")]
    duration: u32,
    #[tabled(rename = "Overrides")]
    overrides: String,
}

pub fn scenarios(global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let infos: Vec<ScenarioInfo> = FaultScenario::ALL
        .into_iter()
        .map(ScenarioInfo::from)
        .collect();
    let out = output::render_list(
        &global.output,
        &infos,
        |s| ScenarioRow {
            scenario: s.scenario.to_string(),
            severity: paint_severity(s.severity, color),
            duration: s.duration_units,
            overrides: s.overrides.join(", "),
        },
        |s| s.scenario.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

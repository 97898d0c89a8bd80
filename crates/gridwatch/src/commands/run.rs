//! Live pipeline: simulate, detect, predict and recommend for a fixed time.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use gridwatch_core::{
    Command as CoreCommand, CommandResult, CommsHealth, EvaluationResult, Fault, FaultFilter,
    FaultScenario, FleetSummary, MaintenanceAction, MaintenanceFilter, Monitor, MonitorConfig,
    MonitorEvent, Prediction, PredictionFilter, ReadingFilter, Repository, SimulatorState,
    SortOrder, maintenance_queue, risk_forecast,
};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs, ScenarioArg};
use crate::commands::report;
use crate::config;
use crate::error::CliError;
use crate::output;

impl From<ScenarioArg> for FaultScenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Overvoltage => Self::Overvoltage,
            ScenarioArg::Undervoltage => Self::Undervoltage,
            ScenarioArg::FrequencyDrift => Self::FrequencyDrift,
            ScenarioArg::HarmonicSpike => Self::HarmonicSpike,
            ScenarioArg::InverterOverheat => Self::InverterOverheat,
            ScenarioArg::ScadaLatency => Self::ScadaLatency,
            ScenarioArg::DcInstability => Self::DcInstability,
        }
    }
}

// ── Summary ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RunSummary {
    duration: String,
    readings: usize,
    predictions: usize,
    simulator: SimulatorState,
    fleet: FleetSummary,
    comms: CommsHealth,
    faults: Vec<Arc<Fault>>,
    risk_forecast: Vec<Arc<Prediction>>,
    maintenance: Vec<Arc<MaintenanceAction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluation: Option<Arc<EvaluationResult>>,
}

/// Live counters shown on the spinner.
#[derive(Default)]
struct Tally {
    readings: u64,
    cycles: u64,
    predictions: usize,
    actions: usize,
    scenarios: u64,
}

impl Tally {
    fn message(&self) -> String {
        format!(
            "{} readings, {} cycles, {} predictions, {} actions, {} scenarios",
            self.readings, self.cycles, self.predictions, self.actions, self.scenarios
        )
    }
}

// ── Setup ───────────────────────────────────────────────────────────

/// Scale the time unit so `speed` units pass per configured unit.
fn apply_speed(config: &mut MonitorConfig, speed: f64) -> Result<(), CliError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(CliError::Validation {
            field: "--speed".into(),
            reason: "must be a positive number".into(),
        });
    }
    let scaled = config.time_unit.div_f64(speed);
    if scaled.is_zero() {
        return Err(CliError::Validation {
            field: "--speed".into(),
            reason: "too fast for the configured time unit".into(),
        });
    }
    config.time_unit = scaled;
    Ok(())
}

fn spinner(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

// ── Event handling ──────────────────────────────────────────────────

fn on_event(
    monitor: &Monitor,
    event: &MonitorEvent,
    recommend: bool,
    tally: &mut Tally,
    bar: &ProgressBar,
) {
    match event {
        MonitorEvent::ReadingRecorded { .. } => tally.readings += 1,
        MonitorEvent::ScenarioActivated { scenario, fault } => {
            tally.scenarios += 1;
            let site = fault.as_ref().map_or("-", |f| f.site_id.as_str());
            bar.println(format!("scenario {scenario} activated (fault at {site})"));
        }
        MonitorEvent::ScenarioExpired { scenario } => {
            bar.println(format!("scenario {scenario} expired"));
        }
        MonitorEvent::PredictionCycleCompleted { report } => {
            tally.cycles += 1;
            tally.predictions += report.predictions.len();
            if recommend {
                for prediction in &report.predictions {
                    if let Err(e) = monitor.recommend(&prediction.id) {
                        warn!(prediction = %prediction.id, error = %e, "recommendation failed");
                    }
                }
            }
        }
        MonitorEvent::MaintenanceRecommended { .. } => tally.actions += 1,
        MonitorEvent::EvaluationRecorded { result } => {
            debug!(f1 = result.f1_score, "evaluation recorded");
        }
    }
    bar.set_message(tally.message());
}

// ── Summary assembly ────────────────────────────────────────────────

/// Filters narrowing the report to one site, or the whole fleet.
struct Scope {
    readings: ReadingFilter,
    faults: FaultFilter,
    predictions: PredictionFilter,
    maintenance: MaintenanceFilter,
}

impl Scope {
    fn new(site: Option<&str>) -> Self {
        match site {
            Some(code) => Self {
                readings: ReadingFilter::BySite(code.to_owned()),
                faults: FaultFilter::BySite(code.to_owned()),
                predictions: PredictionFilter::BySite(code.to_owned()),
                maintenance: MaintenanceFilter::BySite(code.to_owned()),
            },
            None => Self {
                readings: ReadingFilter::All,
                faults: FaultFilter::All,
                predictions: PredictionFilter::All,
                maintenance: MaintenanceFilter::All,
            },
        }
    }
}

async fn summarize(
    monitor: &Monitor,
    site: Option<&str>,
    elapsed: Duration,
    evaluation: Option<Arc<EvaluationResult>>,
) -> RunSummary {
    let store = monitor.store();
    let scope = Scope::new(site);
    let sites: Vec<_> = match site {
        Some(code) => store.site_by_code(code).into_iter().collect(),
        None => store.sites().list(SortOrder::OldestFirst, None),
    };
    let readings = store.readings().filter(
        &|r| scope.readings.matches(r),
        SortOrder::NewestFirst,
        None,
    );
    let faults = store
        .faults()
        .filter(&|f| scope.faults.matches(f), SortOrder::NewestFirst, None);
    let predictions = store.predictions().filter(
        &|p| scope.predictions.matches(p),
        SortOrder::NewestFirst,
        None,
    );
    let mut maintenance = store.maintenance().filter(
        &|a| scope.maintenance.matches(a),
        SortOrder::OldestFirst,
        None,
    );
    maintenance_queue(&mut maintenance);

    RunSummary {
        duration: humantime::format_duration(Duration::from_secs(elapsed.as_secs())).to_string(),
        readings: readings.len(),
        predictions: predictions.len(),
        simulator: monitor.simulator_state().await,
        fleet: FleetSummary::compute(&sites, &faults, &predictions),
        comms: CommsHealth::compute(&readings, &faults),
        risk_forecast: risk_forecast(&predictions),
        faults,
        maintenance,
        evaluation,
    }
}

fn detail(summary: &RunSummary, color: bool) -> String {
    let mut out = String::new();
    let mut heading = format!(
        "Ran for {}: {} readings, {} predictions",
        summary.duration, summary.readings, summary.predictions
    );
    if let Some(active) = &summary.simulator.active {
        heading.push_str(&format!(
            ", {} active ({} units left)",
            active.scenario, active.remaining_units
        ));
    }
    report::section(
        &mut out,
        &heading,
        &report::fleet_lines(&summary.fleet, &summary.comms, color),
    );
    report::section(
        &mut out,
        "Faults",
        &report::faults_table(&summary.faults, color),
    );
    report::section(
        &mut out,
        "Risk forecast",
        &report::predictions_table(&summary.risk_forecast),
    );
    report::section(
        &mut out,
        "Maintenance queue",
        &report::actions_table(&summary.maintenance, color),
    );
    if let Some(eval) = &summary.evaluation {
        report::section(&mut out, "Evaluation", &report::evaluation_lines(eval));
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (mut monitor_config, fleet) = config::resolve(global)?;
    apply_speed(&mut monitor_config, args.speed)?;
    if let Some(code) = &args.site {
        if !fleet.iter().any(|s| &s.site_id == code) {
            return Err(CliError::NotFound {
                resource_type: "site".into(),
                identifier: code.clone(),
            });
        }
    }
    if args.auto_faults {
        monitor_config.auto_fault = true;
    }

    let monitor = Monitor::new(monitor_config, fleet);
    let mut events = monitor.events();
    monitor.start().await?;

    if let Some(scenario) = args.scenario {
        monitor
            .execute(CoreCommand::ActivateScenario {
                scenario: scenario.into(),
            })
            .await?;
    }

    let bar = spinner(global.quiet || !matches!(global.output, OutputFormat::Table));
    let mut tally = Tally::default();
    let started = tokio::time::Instant::now();
    let deadline = tokio::time::sleep(args.duration);
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = &mut ctrl_c => {
                info!("interrupted, stopping early");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => on_event(&monitor, &event, args.recommend, &mut tally, &bar),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    let evaluation = if args.evaluate {
        match monitor.execute(CoreCommand::RunEvaluation).await? {
            CommandResult::Evaluation(result) => Some(result),
            _ => None,
        }
    } else {
        None
    };

    let summary = summarize(&monitor, args.site.as_deref(), started.elapsed(), evaluation).await;
    monitor.stop().await;
    bar.finish_and_clear();

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &summary,
        |s| detail(s, color),
        |s| {
            format!(
                "readings={} predictions={} faults={} actions={}",
                s.readings,
                s.predictions,
                s.faults.len(),
                s.maintenance.len()
            )
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_scales_the_time_unit() {
        let mut config = MonitorConfig::default();
        assert!(apply_speed(&mut config, 4.0).is_ok());
        assert_eq!(config.time_unit, Duration::from_millis(250));
    }

    #[test]
    fn non_positive_speed_is_rejected() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = MonitorConfig::default();
            assert!(matches!(
                apply_speed(&mut config, speed),
                Err(CliError::Validation { .. })
            ));
        }
    }

    #[test]
    fn scenario_args_map_one_to_one() {
        assert_eq!(
            FaultScenario::from(ScenarioArg::DcInstability),
            FaultScenario::DcInstability
        );
        assert_eq!(
            FaultScenario::from(ScenarioArg::ScadaLatency),
            FaultScenario::ScadaLatency
        );
    }
}

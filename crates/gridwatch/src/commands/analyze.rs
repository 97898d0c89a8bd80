//! Offline analysis of recorded telemetry.

use std::sync::Arc;

use serde::Serialize;

use gridwatch_core::{
    CycleReport, MaintenanceAction, Monitor, Prediction, PredictionFilter, TelemetryReading,
    maintenance_queue,
};

use crate::cli::{AnalyzeArgs, GlobalOpts, OutputFormat};
use crate::commands::report;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct AnalysisReport {
    readings: usize,
    sites_evaluated: usize,
    sites_skipped: usize,
    detector_runs: usize,
    predictions: Vec<Arc<Prediction>>,
    maintenance: Vec<Arc<MaintenanceAction>>,
}

/// Parse a JSON array of readings, oldest first.
fn read_readings(file: &std::path::Path) -> Result<Vec<TelemetryReading>, CliError> {
    let raw = std::fs::read_to_string(file)?;
    let mut readings: Vec<TelemetryReading> = serde_json::from_str(&raw)?;
    readings.sort_by_key(|r| r.timestamp);
    Ok(readings)
}

fn analyze(
    monitor: &Monitor,
    readings: Vec<TelemetryReading>,
    recommend: bool,
    filter: &PredictionFilter,
) -> Result<AnalysisReport, CliError> {
    let count = readings.len();
    for reading in readings {
        monitor.ingest(reading)?;
    }

    let CycleReport {
        sites_evaluated,
        sites_skipped,
        detector_runs,
        mut predictions,
        ..
    } = monitor.run_prediction_cycle();
    predictions.retain(|p| filter.matches(p));

    let mut maintenance = Vec::new();
    if recommend {
        for prediction in &predictions {
            let recommendation = monitor.recommend(&prediction.id)?;
            maintenance.push(Arc::clone(recommendation.action()));
        }
        maintenance_queue(&mut maintenance);
    }

    Ok(AnalysisReport {
        readings: count,
        sites_evaluated,
        sites_skipped,
        detector_runs,
        predictions,
        maintenance,
    })
}

fn detail(analysis: &AnalysisReport, color: bool) -> String {
    let mut out = String::new();
    report::section(
        &mut out,
        &format!(
            "Analyzed {} readings: {} sites evaluated, {} skipped, {} detector runs",
            analysis.readings,
            analysis.sites_evaluated,
            analysis.sites_skipped,
            analysis.detector_runs
        ),
        "",
    );
    report::section(
        &mut out,
        "Predictions",
        &report::predictions_table(&analysis.predictions),
    );
    if !analysis.maintenance.is_empty() {
        report::section(
            &mut out,
            "Maintenance queue",
            &report::actions_table(&analysis.maintenance, color),
        );
    }
    out.trim_end().to_owned()
}

pub fn handle(args: AnalyzeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let readings = read_readings(&args.file)?;
    let (mut monitor_config, fleet) = config::resolve(global)?;
    monitor_config.prediction_sample = readings.len().max(1);
    monitor_config.reading_retention = monitor_config.reading_retention.max(readings.len());

    let filter = args
        .site
        .clone()
        .map_or(PredictionFilter::All, PredictionFilter::BySite);

    tracing::info!(readings = readings.len(), file = %args.file.display(), "analyzing telemetry");
    let monitor = Monitor::new(monitor_config, fleet);
    let analysis = analyze(&monitor, readings, args.recommend, &filter)?;

    let color = output::should_color(&global.color);
    let out = match global.output {
        OutputFormat::Plain => analysis
            .predictions
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => output::render_single(
            &global.output,
            &analysis,
            |a| detail(a, color),
            |_| String::new(),
        )?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

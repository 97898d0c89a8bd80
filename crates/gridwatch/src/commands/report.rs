//! Table rows and section rendering shared by `run` and `analyze`.

use std::fmt::Write as _;
use std::sync::Arc;

use tabled::Tabled;

use gridwatch_core::{
    CommsHealth, EvaluationResult, Fault, FleetSummary, MaintenanceAction, Prediction,
};

use crate::output::{self, paint_health, paint_priority, paint_severity, percent};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct PredictionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Fault")]
    fault: String,
    #[tabled(rename = "Probability")]
    probability: String,
    #[tabled(rename = "TTF (min)")]
    ttf: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl From<&Arc<Prediction>> for PredictionRow {
    fn from(p: &Arc<Prediction>) -> Self {
        Self {
            id: p.id.to_string(),
            site: p.site_id.clone(),
            fault: p.predicted_fault_type.to_string(),
            probability: percent(p.fault_probability),
            ttf: p.estimated_time_to_failure_min.to_string(),
            confidence: p.confidence_level.to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct ActionRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Cost (USD)")]
    cost: String,
    #[tabled(rename = "Downtime (h)")]
    downtime: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl ActionRow {
    pub fn new(a: &Arc<MaintenanceAction>, color: bool) -> Self {
        Self {
            site: a.site_id.clone(),
            action: a.recommended_action.clone(),
            priority: paint_priority(a.priority, color),
            cost: a.estimated_repair_cost_usd.to_string(),
            downtime: a.estimated_downtime_if_ignored_hr.to_string(),
            status: a.status.to_string(),
        }
    }
}

#[derive(Tabled)]
struct FaultRow {
    #[tabled(rename = "Fault")]
    fault_id: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Type")]
    fault_type: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "AI")]
    detected: String,
}

impl FaultRow {
    fn new(f: &Arc<Fault>, color: bool) -> Self {
        Self {
            fault_id: f.fault_id.clone(),
            site: f.site_id.clone(),
            fault_type: f.fault_type.to_string(),
            severity: paint_severity(f.severity, color),
            status: f.status.to_string(),
            detected: if f.detected_by_ai { "yes" } else { "no" }.into(),
        }
    }
}

// ── Sections ────────────────────────────────────────────────────────

/// A titled block: heading line, then body.
pub fn section(out: &mut String, title: &str, body: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{body}");
}

pub fn predictions_table(predictions: &[Arc<Prediction>]) -> String {
    let rows: Vec<PredictionRow> = predictions.iter().map(PredictionRow::from).collect();
    output::render_table(&rows)
}

pub fn actions_table(actions: &[Arc<MaintenanceAction>], color: bool) -> String {
    let rows: Vec<ActionRow> = actions.iter().map(|a| ActionRow::new(a, color)).collect();
    output::render_table(&rows)
}

pub fn faults_table(faults: &[Arc<Fault>], color: bool) -> String {
    let rows: Vec<FaultRow> = faults.iter().map(|f| FaultRow::new(f, color)).collect();
    output::render_table(&rows)
}

pub fn fleet_lines(fleet: &FleetSummary, comms: &CommsHealth, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Sites:               {}", fleet.sites);
    let _ = writeln!(out, "  Average health:      {}", fleet.avg_health);
    let _ = writeln!(out, "  Critical sites:      {}", fleet.critical_sites);
    let _ = writeln!(out, "  Active faults:       {}", fleet.active_faults);
    let _ = writeln!(out, "  High-risk forecasts: {}", fleet.high_risk_predictions);
    let _ = writeln!(
        out,
        "  Latency:             {:.1} ms ({})",
        comms.avg_latency_ms,
        paint_health(comms.latency_status, color)
    );
    let _ = writeln!(
        out,
        "  Packet loss:         {:.2}% ({})",
        comms.avg_packet_loss_pct,
        paint_health(comms.packet_loss_status, color)
    );
    let _ = write!(out, "  Cyber faults:        {}", comms.active_cyber_faults);
    out
}

pub fn evaluation_lines(eval: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  Period:       {} days to {}",
        eval.evaluation_period_days, eval.evaluation_date
    );
    let _ = writeln!(
        out,
        "  Confusion:    TP {}  FP {}  FN {}  TN {}",
        eval.true_positives, eval.false_positives, eval.false_negatives, eval.true_negatives
    );
    let _ = writeln!(
        out,
        "  Precision:    {:.3}   Recall: {:.3}   F1: {:.3}",
        eval.precision, eval.recall, eval.f1_score
    );
    let _ = writeln!(out, "  False alarms: {:.3}", eval.false_alarm_rate);
    let _ = write!(
        out,
        "  Lead time:    {} min early warning, detection {} min vs {} min baseline",
        eval.avg_early_warning_lead_time_min,
        eval.ai_detection_time_min,
        eval.baseline_detection_time_min
    );
    out
}

// ── Evaluation domain types ──

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use super::entity_id::EntityId;

/// Periodic scored snapshot of detector performance.
///
/// The business-impact fields are illustrative estimates, not measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: EntityId,
    pub evaluation_date: NaiveDate,
    pub evaluation_period_days: u32,
    pub total_faults_detected: u32,

    // Confusion matrix
    pub true_positives: u32,
    pub false_positives: u32,
    pub false_negatives: u32,
    pub true_negatives: u32,

    // Accuracy
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub false_alarm_rate: f64,

    // Operational impact
    pub avg_early_warning_lead_time_min: u32,
    pub baseline_detection_time_min: u32,
    pub ai_detection_time_min: u32,
    pub fault_isolation_time_reduction_pct: u32,
    pub downtime_prevented_hr: u32,
    pub cost_savings_usd: u32,

    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

impl Record for EvaluationResult {
    const KIND: &'static str = "evaluation result";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

// ── Evaluation / scoring engine ──
//
// Summarizes prediction and fault history into an `EvaluationResult`.
// The confusion matrix is derived from fixed multipliers on record counts
// and the business-impact figures are jittered illustrative baselines; the
// result is a demo scorecard, not a statistical estimate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{EntityId, EvaluationResult, Fault, Prediction};
use crate::predict::MODEL_VERSION;
use crate::store::Repository;

pub const DEFAULT_PERIOD_DAYS: u32 = 7;
/// Newest predictions and faults considered per evaluation.
pub const DEFAULT_HISTORY_SAMPLE: usize = 200;
pub const DEFAULT_LEAD_TIME_MIN: u32 = 35;
pub const BASELINE_DETECTION_MIN: u32 = 45;
pub const AI_DETECTION_MIN: u32 = 12;

/// Confusion-matrix counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: u32,
    pub false_positives: u32,
    pub false_negatives: u32,
    pub true_negatives: u32,
}

impl ConfusionMatrix {
    /// Placeholder derivation from AI-detected fault and prediction counts.
    pub fn from_counts(ai_detected_faults: u32, predictions: u32) -> Self {
        Self {
            true_positives: scaled(ai_detected_faults, 85),
            false_positives: scaled(predictions, 8),
            false_negatives: scaled(ai_detected_faults, 15),
            true_negatives: scaled(predictions, 60),
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Zero counts replaced by fixed illustrative values.
    pub fn with_fallbacks(self) -> Self {
        Self {
            true_positives: nonzero_or(self.true_positives, 12),
            false_positives: nonzero_or(self.false_positives, 3),
            false_negatives: nonzero_or(self.false_negatives, 2),
            true_negatives: nonzero_or(self.true_negatives, 45),
        }
    }
}

/// `floor(count * percent / 100)` in integer arithmetic.
fn scaled(count: u32, percent: u32) -> u32 {
    count.saturating_mul(percent) / 100
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

fn nonzero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 { fallback } else { value }
}

fn nonzero_or_f64(value: f64, fallback: f64) -> f64 {
    if value == 0.0 || value.is_nan() {
        fallback
    } else {
        value
    }
}

/// Harmonic mean of precision and recall; 0 when both are 0.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    let sum = precision + recall;
    if sum == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / sum
    }
}

/// Mean lead time over faults that carry a non-zero lead time, rounded to
/// whole minutes. Defaults to [`DEFAULT_LEAD_TIME_MIN`].
pub fn average_lead_time(faults: &[Arc<Fault>]) -> u32 {
    let (sum, count) = faults
        .iter()
        .filter_map(|f| f.detection_lead_time_min)
        .filter(|v| *v != 0.0 && v.is_finite())
        .fold((0.0, 0.0), |(sum, count), v| (sum + v, count + 1.0));
    if count == 0.0 {
        return DEFAULT_LEAD_TIME_MIN;
    }
    whole_minutes(sum / count)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn whole_minutes(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Computes evaluation scorecards.
#[derive(Debug, Clone)]
pub struct Evaluator {
    period_days: u32,
    model_version: String,
}

impl Evaluator {
    pub fn new(period_days: u32, model_version: impl Into<String>) -> Self {
        Self {
            period_days,
            model_version: model_version.into(),
        }
    }

    /// Score the given history. `rng` drives the illustrative jitter.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        predictions: &[Arc<Prediction>],
        faults: &[Arc<Fault>],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> EvaluationResult {
        let ai_detected = count_u32(faults.iter().filter(|f| f.detected_by_ai).count());
        let matrix = ConfusionMatrix::from_counts(ai_detected, count_u32(predictions.len()));

        let precision = matrix.precision();
        let recall = matrix.recall();
        let f1 = f1_score(precision, recall);
        let stored = matrix.with_fallbacks();

        EvaluationResult {
            id: EntityId::unassigned(),
            evaluation_date: now.date_naive(),
            evaluation_period_days: self.period_days,
            total_faults_detected: ai_detected,
            true_positives: stored.true_positives,
            false_positives: stored.false_positives,
            false_negatives: stored.false_negatives,
            true_negatives: stored.true_negatives,
            precision: nonzero_or_f64(precision, 0.86),
            recall: nonzero_or_f64(recall, 0.92),
            f1_score: nonzero_or_f64(f1, 0.89),
            false_alarm_rate: 0.05 + rng.gen_range(0.0..0.03),
            avg_early_warning_lead_time_min: average_lead_time(faults),
            baseline_detection_time_min: BASELINE_DETECTION_MIN,
            ai_detection_time_min: AI_DETECTION_MIN,
            fault_isolation_time_reduction_pct: 65 + rng.gen_range(0..10),
            downtime_prevented_hr: 18 + rng.gen_range(0..12),
            cost_savings_usd: 35_000 + rng.gen_range(0..20_000),
            model_version: self.model_version.clone(),
            created_at: now,
        }
    }

    /// Score and persist.
    pub fn record<R: Rng + ?Sized>(
        &self,
        predictions: &[Arc<Prediction>],
        faults: &[Arc<Fault>],
        repo: &dyn Repository<EvaluationResult>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Arc<EvaluationResult>, CoreError> {
        let result = self.evaluate(predictions, faults, rng, now);
        let saved = repo.create(result).inspect_err(|e| {
            warn!(error = %e, "failed to save evaluation result");
        })?;
        info!(
            precision = saved.precision,
            recall = saved.recall,
            f1 = saved.f1_score,
            "evaluation recorded"
        );
        Ok(saved)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_DAYS, MODEL_VERSION)
    }
}

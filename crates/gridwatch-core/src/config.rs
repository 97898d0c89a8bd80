// ── Runtime monitor configuration ──
//
// These types describe *how* the monitor runs: cadences, randomness and
// retention. They never touch disk; the CLI builds a `MonitorConfig` from
// gridwatch-config and hands it in.

use std::time::Duration;

use crate::evaluate::{DEFAULT_HISTORY_SAMPLE, DEFAULT_PERIOD_DAYS};
use crate::predict::MODEL_VERSION;
use crate::recommend::DuplicatePolicy;
use crate::store::DEFAULT_READING_RETENTION;

/// Configuration for one monitor instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Wall-clock length of one time unit.
    pub time_unit: Duration,
    /// Reading cadence, in time units. 0 disables generation.
    pub reading_every: u32,
    /// Automatic prediction cadence, in time units. 0 disables it.
    pub prediction_every: u32,
    /// Start with autonomous fault injection enabled.
    pub auto_fault: bool,
    /// Seed for every random draw. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub model_version: String,
    pub duplicate_recommendations: DuplicatePolicy,
    /// Maximum telemetry readings kept in memory.
    pub reading_retention: usize,
    /// Newest readings fed to each prediction cycle.
    pub prediction_sample: usize,
    /// Newest predictions and faults fed to each evaluation.
    pub evaluation_sample: usize,
    pub evaluation_period_days: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
            reading_every: 3,
            prediction_every: 30,
            auto_fault: false,
            seed: None,
            model_version: MODEL_VERSION.into(),
            duplicate_recommendations: DuplicatePolicy::default(),
            reading_retention: DEFAULT_READING_RETENTION,
            prediction_sample: 100,
            evaluation_sample: DEFAULT_HISTORY_SAMPLE,
            evaluation_period_days: DEFAULT_PERIOD_DAYS,
        }
    }
}

impl MonitorConfig {
    /// Wall-clock duration of `units` time units.
    pub fn units(&self, units: u32) -> Duration {
        self.time_unit.saturating_mul(units)
    }
}

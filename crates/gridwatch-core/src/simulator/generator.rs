// ── Telemetry reading generator ──

use chrono::{DateTime, Utc};
use rand::Rng;

use super::scenario::{FaultScenario, MetricRange};
use crate::model::{BreakerStatus, Metric, RelayEvent, TelemetryReading};

/// Normal operating ranges, sampled independently per metric.
pub const BASELINE: [MetricRange; 12] = [
    MetricRange::new(Metric::VoltageKv, 118.0, 124.0),
    MetricRange::new(Metric::CurrentA, 280.0, 340.0),
    MetricRange::new(Metric::FrequencyHz, 59.9, 60.1),
    MetricRange::new(Metric::PowerKw, 3500.0, 4000.0),
    MetricRange::new(Metric::EnergyKwh, 180_000.0, 185_000.0),
    MetricRange::new(Metric::PowerFactor, 0.94, 0.99),
    MetricRange::new(Metric::InverterTempC, 55.0, 70.0),
    MetricRange::new(Metric::DcLinkVoltageV, 650.0, 700.0),
    MetricRange::new(Metric::LatencyMs, 15.0, 40.0),
    MetricRange::new(Metric::PacketLossPct, 0.0, 0.3),
    MetricRange::new(Metric::ThdPct, 2.0, 4.0),
    MetricRange::new(Metric::IrradianceWm2, 800.0, 1000.0),
];

fn sample<R: Rng + ?Sized>(range: &MetricRange, rng: &mut R) -> f64 {
    rng.gen_range(range.low..range.high)
}

/// One reading for `site_id`. Metrics named by `scenario` are drawn from
/// its abnormal ranges; every other metric stays at baseline.
pub fn generate_reading<R: Rng + ?Sized>(
    site_id: &str,
    scenario: Option<FaultScenario>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> TelemetryReading {
    let overrides = scenario.map_or(&[][..], FaultScenario::overrides);
    let mut reading = TelemetryReading::new(site_id, now);
    for baseline in &BASELINE {
        let range = overrides
            .iter()
            .find(|o| o.metric == baseline.metric)
            .unwrap_or(baseline);
        reading.set_metric(baseline.metric, sample(range, rng));
    }
    reading.breaker_status = BreakerStatus::Closed;
    reading.relay_event = RelayEvent::None;
    reading
}

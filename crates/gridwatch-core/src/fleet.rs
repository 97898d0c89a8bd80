// ── Fleet-level views ──
//
// Read-only aggregates over store snapshots: the fleet health summary,
// communications health, and the risk forecast.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use strum::Display;

use crate::model::{Fault, FaultStatus, Prediction, Site, SiteStatus, SiteType, TelemetryReading};
use crate::predict::rank_by_probability;

/// Predictions at or above this probability count as high risk.
pub const HIGH_RISK_PROBABILITY: f64 = 0.7;

/// Readings considered by the communications health view.
pub const COMMS_WINDOW: usize = 50;

/// Predictions shown by the risk forecast.
pub const RISK_FORECAST_LEN: usize = 5;

/// Built-in fleet used when no sites are configured.
pub fn demo_fleet(now: DateTime<Utc>) -> Vec<Site> {
    let entries: [(&str, &str, &str, SiteType, f64, u32, (i32, u32, u32)); 5] = [
        ("SITE-001", "Mojave Sun Array", "Barstow, CA", SiteType::Solar, 120.0, 48, (2019, 4, 12)),
        ("SITE-002", "Tehachapi Ridge", "Tehachapi, CA", SiteType::Wind, 85.5, 32, (2017, 9, 3)),
        ("SITE-003", "Sonoran Flats", "Gila Bend, AZ", SiteType::Solar, 210.0, 96, (2021, 1, 20)),
        ("SITE-004", "High Plains Hybrid", "Amarillo, TX", SiteType::Hybrid, 150.0, 64, (2020, 6, 8)),
        ("SITE-005", "Columbia Gorge", "Goldendale, WA", SiteType::Wind, 99.0, 40, (2016, 11, 15)),
    ];

    entries
        .into_iter()
        .map(|(code, name, location, site_type, capacity, inverters, (y, m, d))| {
            let mut site = Site::new(code, name, site_type, now);
            site.location = location.to_owned();
            site.capacity_mw = capacity;
            site.inverter_count = inverters;
            site.commission_date = NaiveDate::from_ymd_opt(y, m, d);
            site
        })
        .collect()
}

// ── Fleet summary ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    pub sites: usize,
    /// Rounded mean health score; sites without a score count as 100.
    pub avg_health: u32,
    pub critical_sites: usize,
    pub active_faults: usize,
    pub high_risk_predictions: usize,
}

impl FleetSummary {
    pub fn compute(sites: &[Arc<Site>], faults: &[Arc<Fault>], predictions: &[Arc<Prediction>]) -> Self {
        let avg_health = if sites.is_empty() {
            100
        } else {
            let total: f64 = sites.iter().map(|s| s.health_score.unwrap_or(100.0)).sum();
            whole(total / count_f64(sites.len()))
        };

        Self {
            sites: sites.len(),
            avg_health,
            critical_sites: sites
                .iter()
                .filter(|s| s.status == SiteStatus::Critical)
                .count(),
            active_faults: faults
                .iter()
                .filter(|f| f.status == FaultStatus::Active)
                .count(),
            high_risk_predictions: predictions
                .iter()
                .filter(|p| p.fault_probability >= HIGH_RISK_PROBABILITY)
                .count(),
        }
    }
}

// ── Communications health ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    Warning,
    Critical,
}

impl HealthLevel {
    fn grade(value: f64, healthy_below: f64, warning_below: f64) -> Self {
        if value < healthy_below {
            Self::Healthy
        } else if value < warning_below {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommsHealth {
    pub readings: usize,
    pub avg_latency_ms: f64,
    pub latency_status: HealthLevel,
    pub avg_packet_loss_pct: f64,
    pub packet_loss_status: HealthLevel,
    pub active_cyber_faults: usize,
}

impl CommsHealth {
    /// Health over the newest [`COMMS_WINDOW`] readings (newest first).
    /// Missing values count as zero.
    pub fn compute(readings: &[Arc<TelemetryReading>], faults: &[Arc<Fault>]) -> Self {
        let recent = readings.iter().take(COMMS_WINDOW);
        let (latency, loss, n) = recent.fold((0.0, 0.0, 0usize), |(l, p, n), r| {
            (
                l + r.latency_ms.unwrap_or(0.0),
                p + r.packet_loss_pct.unwrap_or(0.0),
                n + 1,
            )
        });
        let (avg_latency_ms, avg_packet_loss_pct) = if n == 0 {
            (0.0, 0.0)
        } else {
            (latency / count_f64(n), loss / count_f64(n))
        };

        Self {
            readings: n,
            avg_latency_ms,
            latency_status: HealthLevel::grade(avg_latency_ms, 50.0, 150.0),
            avg_packet_loss_pct,
            packet_loss_status: HealthLevel::grade(avg_packet_loss_pct, 0.5, 2.0),
            active_cyber_faults: faults
                .iter()
                .filter(|f| f.status == FaultStatus::Active && f.fault_type.is_cyber())
                .count(),
        }
    }
}

/// The highest-probability predictions, best first.
pub fn risk_forecast(predictions: &[Arc<Prediction>]) -> Vec<Arc<Prediction>> {
    let mut ranked = predictions.to_vec();
    rank_by_probability(&mut ranked);
    ranked.truncate(RISK_FORECAST_LEN);
    ranked
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn count_f64(n: usize) -> f64 {
    n as f64
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn whole(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

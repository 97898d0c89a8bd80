// ── Telemetry domain types ──
//
// A reading is an immutable SCADA snapshot for one site. Numeric channels
// are optional because externally supplied readings may omit any of them;
// `metric()` substitutes the neutral value for a missing channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::Record;
use super::entity_id::EntityId;

/// Circuit breaker position reported by the site RTU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerStatus {
    #[default]
    Closed,
    Open,
    Tripped,
}

/// Most recent protection relay event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayEvent {
    #[default]
    None,
    Trip,
    Reclose,
    Alarm,
}

/// Numeric telemetry channel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    VoltageKv,
    CurrentA,
    FrequencyHz,
    PowerKw,
    EnergyKwh,
    PowerFactor,
    InverterTempC,
    DcLinkVoltageV,
    LatencyMs,
    PacketLossPct,
    ThdPct,
    IrradianceWm2,
}

impl Metric {
    /// Value assumed when a reading does not carry this channel.
    pub fn neutral(self) -> f64 {
        match self {
            Self::FrequencyHz => 60.0,
            _ => 0.0,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::VoltageKv => "kV",
            Self::CurrentA => "A",
            Self::FrequencyHz => "Hz",
            Self::PowerKw => "kW",
            Self::EnergyKwh => "kWh",
            Self::PowerFactor => "",
            Self::InverterTempC => "°C",
            Self::DcLinkVoltageV => "V",
            Self::LatencyMs => "ms",
            Self::PacketLossPct | Self::ThdPct => "%",
            Self::IrradianceWm2 => "W/m²",
        }
    }
}

/// Point-in-time snapshot for one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryReading {
    #[serde(default)]
    pub id: EntityId,
    pub site_id: String,
    pub timestamp: DateTime<Utc>,

    // Electrical
    #[serde(default)]
    pub voltage_kv: Option<f64>,
    #[serde(default)]
    pub current_a: Option<f64>,
    #[serde(default)]
    pub frequency_hz: Option<f64>,
    #[serde(default)]
    pub power_kw: Option<f64>,
    #[serde(default)]
    pub energy_kwh: Option<f64>,
    #[serde(default)]
    pub power_factor: Option<f64>,

    // Thermal / DC side
    #[serde(default)]
    pub inverter_temp_c: Option<f64>,
    #[serde(default)]
    pub dc_link_voltage_v: Option<f64>,

    // Discrete state
    #[serde(default)]
    pub breaker_status: BreakerStatus,
    #[serde(default)]
    pub relay_event: RelayEvent,

    // Comms
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub packet_loss_pct: Option<f64>,

    // Power quality / environment
    #[serde(default)]
    pub thd_pct: Option<f64>,
    #[serde(default)]
    pub irradiance_wm2: Option<f64>,
}

impl TelemetryReading {
    /// An empty reading for `site_id`; every numeric channel is absent.
    pub fn new(site_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            site_id: site_id.into(),
            timestamp,
            ..Self::default()
        }
    }

    /// Channel value, or the channel's neutral value when absent. A
    /// frequency of zero or below is treated as absent.
    pub fn metric(&self, metric: Metric) -> f64 {
        match self.raw_metric(metric) {
            Some(value) if metric == Metric::FrequencyHz && value <= 0.0 => metric.neutral(),
            Some(value) => value,
            None => metric.neutral(),
        }
    }

    /// Channel value as recorded.
    pub fn raw_metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::VoltageKv => self.voltage_kv,
            Metric::CurrentA => self.current_a,
            Metric::FrequencyHz => self.frequency_hz,
            Metric::PowerKw => self.power_kw,
            Metric::EnergyKwh => self.energy_kwh,
            Metric::PowerFactor => self.power_factor,
            Metric::InverterTempC => self.inverter_temp_c,
            Metric::DcLinkVoltageV => self.dc_link_voltage_v,
            Metric::LatencyMs => self.latency_ms,
            Metric::PacketLossPct => self.packet_loss_pct,
            Metric::ThdPct => self.thd_pct,
            Metric::IrradianceWm2 => self.irradiance_wm2,
        }
    }

    pub fn set_metric(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::VoltageKv => &mut self.voltage_kv,
            Metric::CurrentA => &mut self.current_a,
            Metric::FrequencyHz => &mut self.frequency_hz,
            Metric::PowerKw => &mut self.power_kw,
            Metric::EnergyKwh => &mut self.energy_kwh,
            Metric::PowerFactor => &mut self.power_factor,
            Metric::InverterTempC => &mut self.inverter_temp_c,
            Metric::DcLinkVoltageV => &mut self.dc_link_voltage_v,
            Metric::LatencyMs => &mut self.latency_ms,
            Metric::PacketLossPct => &mut self.packet_loss_pct,
            Metric::ThdPct => &mut self.thd_pct,
            Metric::IrradianceWm2 => &mut self.irradiance_wm2,
        };
        *slot = Some(value);
    }

    /// Builder-style variant of [`set_metric`](Self::set_metric).
    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        self.set_metric(metric, value);
        self
    }
}

impl Record for TelemetryReading {
    const KIND: &'static str = "telemetry reading";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn missing_frequency_reads_as_sixty_hertz() {
        let reading = TelemetryReading::new("S1", Utc::now());
        assert!((reading.metric(Metric::FrequencyHz) - 60.0).abs() < f64::EPSILON);
        assert!(reading.metric(Metric::VoltageKv).abs() < f64::EPSILON);
    }

    #[test]
    fn dead_frequency_reads_as_sixty_hertz() {
        let zero =
            TelemetryReading::new("S1", Utc::now()).with_metric(Metric::FrequencyHz, 0.0);
        assert!((zero.metric(Metric::FrequencyHz) - 60.0).abs() < f64::EPSILON);
        assert_eq!(zero.raw_metric(Metric::FrequencyHz), Some(0.0));

        let zero_volts =
            TelemetryReading::new("S1", Utc::now()).with_metric(Metric::VoltageKv, 0.0);
        assert!(zero_volts.metric(Metric::VoltageKv).abs() < f64::EPSILON);
    }

    #[test]
    fn set_metric_writes_every_channel() {
        let mut reading = TelemetryReading::new("S1", Utc::now());
        let mut value = 0.0;
        for metric in Metric::iter() {
            value += 1.0;
            reading.set_metric(metric, value);
        }
        let mut expected = 0.0;
        for metric in Metric::iter() {
            expected += 1.0;
            assert_eq!(reading.raw_metric(metric), Some(expected), "{metric}");
        }
    }

    #[test]
    fn deserializes_partial_reading() {
        let json = r#"{"site_id":"S1","timestamp":"2025-01-01T00:00:00Z","voltage_kv":126.5}"#;
        let reading: TelemetryReading = serde_json::from_str(json).expect("valid reading");
        assert_eq!(reading.voltage_kv, Some(126.5));
        assert_eq!(reading.thd_pct, None);
        assert_eq!(reading.breaker_status, BreakerStatus::Closed);
        assert!(reading.id.is_unassigned());
    }
}

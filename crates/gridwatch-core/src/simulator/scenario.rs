// ── Fault scenarios ──
//
// A scenario overrides a subset of telemetry channels with abnormal ranges
// for a fixed number of time units.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::model::{FaultType, Metric, Severity};

/// Half-open sampling range `[low, high)` for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricRange {
    pub metric: Metric,
    pub low: f64,
    pub high: f64,
}

impl MetricRange {
    pub const fn new(metric: Metric, low: f64, high: f64) -> Self {
        Self { metric, low, high }
    }
}

/// An injectable abnormal operating condition.
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
pub enum FaultScenario {
    Overvoltage,
    Undervoltage,
    FrequencyDrift,
    HarmonicSpike,
    InverterOverheat,
    ScadaLatency,
    DcInstability,
}

impl FaultScenario {
    pub const ALL: [Self; 7] = [
        Self::Overvoltage,
        Self::Undervoltage,
        Self::FrequencyDrift,
        Self::HarmonicSpike,
        Self::InverterOverheat,
        Self::ScadaLatency,
        Self::DcInstability,
    ];

    pub fn fault_type(self) -> FaultType {
        match self {
            Self::Overvoltage => FaultType::Overvoltage,
            Self::Undervoltage => FaultType::Undervoltage,
            Self::FrequencyDrift => FaultType::FrequencyDrift,
            Self::HarmonicSpike => FaultType::HarmonicSpike,
            Self::InverterOverheat => FaultType::InverterOverheat,
            Self::ScadaLatency => FaultType::ScadaLatency,
            Self::DcInstability => FaultType::DcInstability,
        }
    }

    /// Channels replaced while the scenario is active.
    pub fn overrides(self) -> &'static [MetricRange] {
        static OVERVOLTAGE: [MetricRange; 1] = [MetricRange::new(Metric::VoltageKv, 130.0, 145.0)];
        static UNDERVOLTAGE: [MetricRange; 1] = [MetricRange::new(Metric::VoltageKv, 95.0, 105.0)];
        static FREQUENCY: [MetricRange; 1] = [MetricRange::new(Metric::FrequencyHz, 58.5, 59.3)];
        static HARMONIC: [MetricRange; 1] = [MetricRange::new(Metric::ThdPct, 10.0, 18.0)];
        static OVERHEAT: [MetricRange; 1] = [MetricRange::new(Metric::InverterTempC, 85.0, 105.0)];
        static LATENCY: [MetricRange; 2] = [
            MetricRange::new(Metric::LatencyMs, 200.0, 500.0),
            MetricRange::new(Metric::PacketLossPct, 2.0, 8.0),
        ];
        static DC: [MetricRange; 1] = [MetricRange::new(Metric::DcLinkVoltageV, 400.0, 550.0)];

        match self {
            Self::Overvoltage => &OVERVOLTAGE,
            Self::Undervoltage => &UNDERVOLTAGE,
            Self::FrequencyDrift => &FREQUENCY,
            Self::HarmonicSpike => &HARMONIC,
            Self::InverterOverheat => &OVERHEAT,
            Self::ScadaLatency => &LATENCY,
            Self::DcInstability => &DC,
        }
    }

    /// Active duration in time units.
    pub fn duration_units(self) -> u32 {
        match self {
            Self::Overvoltage | Self::ScadaLatency => 30,
            Self::Undervoltage | Self::DcInstability => 25,
            Self::FrequencyDrift => 20,
            Self::HarmonicSpike => 15,
            Self::InverterOverheat => 45,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Overvoltage | Self::InverterOverheat | Self::ScadaLatency => Severity::High,
            Self::Undervoltage
            | Self::FrequencyDrift
            | Self::HarmonicSpike
            | Self::DcInstability => Severity::Medium,
        }
    }

    pub fn trigger_condition(self) -> String {
        format!("Simulated {self} event")
    }
}

/// Observable symptoms recorded on a fault of this type.
pub fn symptoms_for(fault_type: &FaultType) -> Vec<String> {
    let symptoms: &[&str] = match fault_type {
        FaultType::Overvoltage => &[
            "Voltage spike detected",
            "Inverter protection triggered",
            "Grid instability warning",
        ],
        FaultType::Undervoltage => &[
            "Power output drop",
            "Relay chatter observed",
            "Brownout conditions",
        ],
        FaultType::FrequencyDrift => &[
            "Frequency deviation",
            "Protection relay warning",
            "Grid sync issues",
        ],
        FaultType::HarmonicSpike => &[
            "THD threshold exceeded",
            "Power quality degradation",
            "Capacitor stress",
        ],
        FaultType::InverterOverheat => &[
            "Temperature alarm",
            "Output derating active",
            "Cooling system stress",
        ],
        FaultType::ScadaLatency => &[
            "Communication delay",
            "Command execution lag",
            "Packet loss detected",
        ],
        FaultType::DcInstability => &["DC ripple variance", "MPPT oscillation", "String imbalance"],
        FaultType::Other(_) => &["Anomaly detected"],
    };
    symptoms.iter().map(|&s| s.to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_match_scenario_table() {
        let high: Vec<_> = FaultScenario::ALL
            .into_iter()
            .filter(|s| s.severity() == Severity::High)
            .collect();
        assert_eq!(
            high,
            vec![
                FaultScenario::Overvoltage,
                FaultScenario::InverterOverheat,
                FaultScenario::ScadaLatency
            ]
        );
    }

    #[test]
    fn scada_latency_overrides_two_channels() {
        let metrics: Vec<_> = FaultScenario::ScadaLatency
            .overrides()
            .iter()
            .map(|r| r.metric)
            .collect();
        assert_eq!(metrics, vec![Metric::LatencyMs, Metric::PacketLossPct]);
    }

    #[test]
    fn names_parse_and_render_snake_case() {
        let parsed: FaultScenario = "inverter_overheat".parse().expect("known scenario");
        assert_eq!(parsed, FaultScenario::InverterOverheat);
        assert_eq!(
            FaultScenario::FrequencyDrift.trigger_condition(),
            "Simulated frequency_drift event"
        );
        assert_eq!(FaultScenario::HarmonicSpike.fault_type().as_str(), "harmonic_spike");
    }

    #[test]
    fn unknown_fault_type_gets_generic_symptom() {
        assert_eq!(
            symptoms_for(&FaultType::Other("islanding".into())),
            vec!["Anomaly detected".to_owned()]
        );
        assert_eq!(symptoms_for(&FaultType::DcInstability).len(), 3);
    }
}

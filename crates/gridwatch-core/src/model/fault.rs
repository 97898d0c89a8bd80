// ── Fault domain types ──

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

use super::Record;
use super::entity_id::EntityId;

/// Category of abnormal operating condition.
///
/// The known categories are closed; anything else read from a record is
/// preserved verbatim in `Other` so that downstream tables can fall back
/// to their generic entries instead of rejecting the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaultType {
    Overvoltage,
    Undervoltage,
    FrequencyDrift,
    HarmonicSpike,
    InverterOverheat,
    ScadaLatency,
    DcInstability,
    Other(String),
}

impl FaultType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "overvoltage" => Self::Overvoltage,
            "undervoltage" => Self::Undervoltage,
            "frequency_drift" => Self::FrequencyDrift,
            "harmonic_spike" => Self::HarmonicSpike,
            "inverter_overheat" => Self::InverterOverheat,
            "scada_latency" => Self::ScadaLatency,
            "dc_instability" => Self::DcInstability,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Overvoltage => "overvoltage",
            Self::Undervoltage => "undervoltage",
            Self::FrequencyDrift => "frequency_drift",
            Self::HarmonicSpike => "harmonic_spike",
            Self::InverterOverheat => "inverter_overheat",
            Self::ScadaLatency => "scada_latency",
            Self::DcInstability => "dc_instability",
            Self::Other(name) => name,
        }
    }

    /// Communications-layer faults surfaced on the cyber health view.
    pub fn is_cyber(&self) -> bool {
        match self {
            Self::ScadaLatency => true,
            Self::Other(name) => name == "unauthorized_command",
            _ => false,
        }
    }
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl Serialize for FaultType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FaultType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_name(&raw))
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Fault lifecycle, advanced by operators.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FaultStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl FaultStatus {
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Acknowledged)
                | (Self::Active | Self::Acknowledged, Self::Resolved)
        )
    }
}

/// A detected or injected abnormal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fault {
    pub id: EntityId,
    /// Human-facing reference, e.g. `F-1717171717000`.
    pub fault_id: String,
    pub site_id: String,
    pub fault_type: FaultType,
    pub severity: Severity,
    pub status: FaultStatus,
    pub start_timestamp: DateTime<Utc>,
    pub trigger_condition: String,
    pub observable_symptoms: Vec<String>,
    pub detected_by_ai: bool,
    pub detection_lead_time_min: Option<f64>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Fault {
    pub fn is_active(&self) -> bool {
        self.status == FaultStatus::Active
    }
}

impl Record for Fault {
    const KIND: &'static str = "fault";

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

    #[test]
    fn fault_type_round_trips_known_and_unknown_names() {
        let known: FaultType = serde_json::from_str("\"frequency_drift\"").expect("json");
        assert_eq!(known, FaultType::FrequencyDrift);

        let unknown: FaultType = serde_json::from_str("\"islanding\"").expect("json");
        assert_eq!(unknown, FaultType::Other("islanding".into()));
        assert_eq!(serde_json::to_string(&unknown).expect("json"), "\"islanding\"");
    }

    #[test]
    fn fault_lifecycle_only_moves_forward() {
        assert!(FaultStatus::Active.can_transition_to(FaultStatus::Acknowledged));
        assert!(FaultStatus::Acknowledged.can_transition_to(FaultStatus::Resolved));
        assert!(FaultStatus::Active.can_transition_to(FaultStatus::Resolved));
        assert!(!FaultStatus::Resolved.can_transition_to(FaultStatus::Active));
        assert!(!FaultStatus::Acknowledged.can_transition_to(FaultStatus::Active));
    }

    #[test]
    fn cyber_faults() {
        assert!(FaultType::ScadaLatency.is_cyber());
        assert!(FaultType::Other("unauthorized_command".into()).is_cyber());
        assert!(!FaultType::Overvoltage.is_cyber());
    }
}

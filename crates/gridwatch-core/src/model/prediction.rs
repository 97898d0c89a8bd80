// ── Prediction domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::Record;
use super::entity_id::EntityId;
use super::fault::FaultType;

/// Coarse bucket derived from a continuous fault probability.
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
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// `>= 0.85` very high, `>= 0.7` high, `>= 0.5` medium, otherwise low.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.85 {
            Self::VeryHigh
        } else if probability >= 0.7 {
            Self::High
        } else if probability >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Forward-looking fault estimate for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: EntityId,
    pub site_id: String,
    pub timestamp: DateTime<Utc>,
    pub predicted_fault_type: FaultType,
    pub fault_probability: f64,
    pub estimated_time_to_failure_min: u32,
    pub confidence_level: ConfidenceLevel,
    pub contributing_factors: Vec<String>,
    pub model_version: String,
    /// Ground-truth label, backfilled after the fact.
    pub was_accurate: Option<bool>,
}

impl Record for Prediction {
    const KIND: &'static str = "prediction";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

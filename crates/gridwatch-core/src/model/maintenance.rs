// ── Maintenance domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::Record;
use super::entity_id::EntityId;
use super::fault::FaultType;

/// Work-order urgency. Declared most urgent first so that the derived
/// `Ord` sorts a queue critical > high > medium > low.
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
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// `>= 0.8` critical, `>= 0.6` high, otherwise medium.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.8 {
            Self::Critical
        } else if probability >= 0.6 {
            Self::High
        } else {
            Self::Medium
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Deferred,
}

impl MaintenanceStatus {
    /// Operators may only schedule or start a pending action.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Scheduled | Self::InProgress)
        )
    }
}

/// A maintenance recommendation derived from one prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceAction {
    pub id: EntityId,
    pub site_id: String,
    pub fault_type: FaultType,
    pub recommended_action: String,
    pub priority: Priority,
    pub justification: Vec<String>,
    pub estimated_repair_cost_usd: u32,
    pub estimated_completion_time_hr: u32,
    pub estimated_downtime_if_ignored_hr: u32,
    pub status: MaintenanceStatus,
    pub triggered_by_prediction_id: EntityId,
    pub created_at: DateTime<Utc>,
}

impl Record for MaintenanceAction {
    const KIND: &'static str = "maintenance action";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

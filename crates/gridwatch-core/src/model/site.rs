// ── Site domain types ──

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::Record;
use super::entity_id::EntityId;

/// Generation technology installed at a site.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SiteType {
    Solar,
    Wind,
    Hybrid,
}

/// Operational status, maintained by external health logic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SiteStatus {
    Operational,
    Degraded,
    Critical,
    Offline,
}

/// A generation site in the fleet registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: EntityId,
    /// Operator-facing site code (e.g. "SITE-001"). Telemetry, faults and
    /// predictions reference sites by this code.
    pub site_id: String,
    pub name: String,
    pub location: String,
    pub site_type: SiteType,
    pub capacity_mw: f64,
    pub inverter_count: u32,
    pub commission_date: Option<NaiveDate>,
    /// 0-100. Missing scores count as fully healthy in fleet summaries.
    pub health_score: Option<f64>,
    pub status: SiteStatus,
    pub created_at: DateTime<Utc>,
}

impl Site {
    /// A healthy, operational site keyed by its code.
    pub fn new(
        site_id: impl Into<String>,
        name: impl Into<String>,
        site_type: SiteType,
        now: DateTime<Utc>,
    ) -> Self {
        let site_id = site_id.into();
        Self {
            id: EntityId::Named(site_id.clone()),
            site_id,
            name: name.into(),
            location: String::new(),
            site_type,
            capacity_mw: 0.0,
            inverter_count: 0,
            commission_date: None,
            health_score: Some(100.0),
            status: SiteStatus::Operational,
            created_at: now,
        }
    }
}

impl Record for Site {
    const KIND: &'static str = "site";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

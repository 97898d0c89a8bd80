// ── Maintenance recommendation generator ──
//
// Maps a prediction onto a costed, prioritized maintenance action using a
// fixed template table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{
    EntityId, FaultType, MaintenanceAction, MaintenanceStatus, Prediction, Priority,
};
use crate::store::{Repository, SortOrder};

/// Justification used when a prediction carries no contributing factors.
pub const FALLBACK_JUSTIFICATION: &str = "AI prediction triggered";

/// Action text and flat estimates for one fault type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionTemplate {
    pub action: &'static str,
    pub cost_usd: u32,
    pub downtime_hr: u32,
}

const fn template(action: &'static str, cost_usd: u32, downtime_hr: u32) -> ActionTemplate {
    ActionTemplate {
        action,
        cost_usd,
        downtime_hr,
    }
}

pub fn template_for(fault_type: &FaultType) -> ActionTemplate {
    match fault_type {
        FaultType::Overvoltage => template(
            "Inspect voltage regulator and transformer tap settings",
            2500,
            4,
        ),
        FaultType::Undervoltage => {
            template("Check load balancing and grid connection points", 1800, 3)
        }
        FaultType::FrequencyDrift => {
            template("Verify governor settings and grid synchronization", 3200, 6)
        }
        FaultType::InverterOverheat => {
            template("Inspect inverter cooling fan and airflow systems", 1500, 2)
        }
        FaultType::ScadaLatency => {
            template("Check RTU connections and network infrastructure", 800, 1)
        }
        FaultType::HarmonicSpike => {
            template("Inspect harmonic filters and capacitor banks", 2200, 3)
        }
        FaultType::DcInstability => template("Check MPPT settings and string connections", 1200, 2),
        FaultType::Other(_) => template("General inspection recommended", 1000, 2),
    }
}

/// What to do when a prediction already has a recommendation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Create another action every time.
    #[default]
    Allow,
    /// Return the existing action instead of creating one.
    Skip,
}

/// Outcome of a recommendation request.
#[derive(Debug, Clone)]
pub enum Recommendation {
    Created(Arc<MaintenanceAction>),
    Existing(Arc<MaintenanceAction>),
}

impl Recommendation {
    pub fn action(&self) -> &Arc<MaintenanceAction> {
        match self {
            Self::Created(a) | Self::Existing(a) => a,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationGenerator {
    policy: DuplicatePolicy,
}

impl RecommendationGenerator {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Build the action for `prediction` without persisting it.
    pub fn build(prediction: &Prediction, now: DateTime<Utc>) -> MaintenanceAction {
        let template = template_for(&prediction.predicted_fault_type);
        let justification = if prediction.contributing_factors.is_empty() {
            vec![FALLBACK_JUSTIFICATION.to_owned()]
        } else {
            prediction.contributing_factors.clone()
        };

        MaintenanceAction {
            id: EntityId::unassigned(),
            site_id: prediction.site_id.clone(),
            fault_type: prediction.predicted_fault_type.clone(),
            recommended_action: template.action.to_owned(),
            priority: Priority::from_probability(prediction.fault_probability),
            justification,
            estimated_repair_cost_usd: template.cost_usd,
            estimated_completion_time_hr: template.downtime_hr,
            estimated_downtime_if_ignored_hr: template.downtime_hr * 2,
            status: MaintenanceStatus::Pending,
            triggered_by_prediction_id: prediction.id.clone(),
            created_at: now,
        }
    }

    /// Create a pending action for `prediction`, honoring the duplicate policy.
    pub fn recommend(
        &self,
        prediction: &Prediction,
        repo: &dyn Repository<MaintenanceAction>,
        now: DateTime<Utc>,
    ) -> Result<Recommendation, CoreError> {
        if self.policy == DuplicatePolicy::Skip {
            let existing = repo.filter(
                &|a| a.triggered_by_prediction_id == prediction.id,
                SortOrder::OldestFirst,
                Some(1),
            );
            if let Some(action) = existing.into_iter().next() {
                debug!(prediction = %prediction.id, action = %action.id, "recommendation already exists");
                return Ok(Recommendation::Existing(action));
            }
        }

        let saved = repo.create(Self::build(prediction, now)).inspect_err(|e| {
            warn!(prediction = %prediction.id, error = %e, "failed to save maintenance action");
        })?;
        debug!(
            site = %saved.site_id,
            priority = %saved.priority,
            "maintenance action recommended"
        );
        Ok(Recommendation::Created(saved))
    }
}

/// Order a maintenance queue critical first. Ties keep their order.
pub fn maintenance_queue(actions: &mut [Arc<MaintenanceAction>]) {
    actions.sort_by_key(|a| a.priority);
}

// ── Reactive record storage ──
//
// One `EntityCollection` per record type, grouped in the `DataStore`.
// Services talk to collections through the `Repository` trait so that a
// failing backend can be substituted in tests.

pub mod collection;
mod registry;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{
    EntityId, EvaluationResult, Fault, MaintenanceAction, Prediction, Record, Site,
    TelemetryReading,
};
use crate::stream::EntityStream;

pub use collection::EntityCollection;

/// Default cap on stored telemetry readings.
pub const DEFAULT_READING_RETENTION: usize = 5000;

// ── Ordering ────────────────────────────────────────────────────────

/// Query ordering over the implicit creation timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// `-created_date`
    #[default]
    NewestFirst,
    /// `created_date`
    OldestFirst,
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-created_date" | "newest" => Ok(Self::NewestFirst),
            "created_date" | "oldest" => Ok(Self::OldestFirst),
            other => Err(CoreError::ValidationFailed {
                message: format!("unknown sort order '{other}'"),
            }),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewestFirst => f.write_str("-created_date"),
            Self::OldestFirst => f.write_str("created_date"),
        }
    }
}

// ── Repository seam ─────────────────────────────────────────────────

/// Persistence operations the services depend on.
pub trait Repository<T: Record>: Send + Sync {
    /// Persist a new record, assigning an id when it has none.
    fn create(&self, record: T) -> Result<Arc<T>, CoreError>;

    fn list(&self, order: SortOrder, limit: Option<usize>) -> Vec<Arc<T>>;

    fn filter(
        &self,
        predicate: &dyn Fn(&T) -> bool,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Vec<Arc<T>>;

    /// Apply `patch` to a copy of the record and store it. The stored
    /// record is untouched when the patch fails.
    fn update(
        &self,
        id: &EntityId,
        patch: &dyn Fn(&mut T) -> Result<(), CoreError>,
    ) -> Result<Arc<T>, CoreError>;

    fn get(&self, id: &EntityId) -> Option<Arc<T>>;
}

// ── DataStore ───────────────────────────────────────────────────────

/// In-memory store for every gridwatch record type.
pub struct DataStore {
    pub(crate) sites: EntityCollection<Site>,
    pub(crate) readings: EntityCollection<TelemetryReading>,
    pub(crate) faults: EntityCollection<Fault>,
    pub(crate) predictions: EntityCollection<Prediction>,
    pub(crate) maintenance: EntityCollection<MaintenanceAction>,
    pub(crate) evaluations: EntityCollection<EvaluationResult>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::with_reading_retention(DEFAULT_READING_RETENTION)
    }

    pub fn with_reading_retention(limit: usize) -> Self {
        Self {
            sites: EntityCollection::new(),
            readings: EntityCollection::with_retention(limit),
            faults: EntityCollection::new(),
            predictions: EntityCollection::new(),
            maintenance: EntityCollection::new(),
            evaluations: EntityCollection::new(),
        }
    }

    // ── Collection access ────────────────────────────────────────────

    pub fn sites(&self) -> &EntityCollection<Site> {
        &self.sites
    }

    pub fn readings(&self) -> &EntityCollection<TelemetryReading> {
        &self.readings
    }

    pub fn faults(&self) -> &EntityCollection<Fault> {
        &self.faults
    }

    pub fn predictions(&self) -> &EntityCollection<Prediction> {
        &self.predictions
    }

    pub fn maintenance(&self) -> &EntityCollection<MaintenanceAction> {
        &self.maintenance
    }

    pub fn evaluations(&self) -> &EntityCollection<EvaluationResult> {
        &self.evaluations
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Find a site by its operator-facing code.
    pub fn site_by_code(&self, site_id: &str) -> Option<Arc<Site>> {
        self.sites
            .filter(&|s| s.site_id == site_id, SortOrder::OldestFirst, Some(1))
            .into_iter()
            .next()
    }

    /// Display name for a site code, falling back to the code itself.
    pub fn site_name(&self, site_id: &str) -> String {
        self.site_by_code(site_id)
            .map_or_else(|| site_id.to_owned(), |s| s.name.clone())
    }

    /// Most recent `limit` readings for one site, newest first.
    pub fn recent_readings(&self, site_id: &str, limit: usize) -> Vec<Arc<TelemetryReading>> {
        self.readings
            .filter(&|r| r.site_id == site_id, SortOrder::NewestFirst, Some(limit))
    }

    /// Faults that have not been resolved, newest first.
    pub fn open_faults(&self) -> Vec<Arc<Fault>> {
        self.faults.filter(
            &|f| f.status != crate::model::FaultStatus::Resolved,
            SortOrder::NewestFirst,
            None,
        )
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_readings(&self) -> EntityStream<TelemetryReading> {
        EntityStream::new(self.readings.subscribe())
    }

    pub fn subscribe_faults(&self) -> EntityStream<Fault> {
        EntityStream::new(self.faults.subscribe())
    }

    pub fn subscribe_predictions(&self) -> EntityStream<Prediction> {
        EntityStream::new(self.predictions.subscribe())
    }

    pub fn subscribe_maintenance(&self) -> EntityStream<MaintenanceAction> {
        EntityStream::new(self.maintenance.subscribe())
    }

    /// Drop every stored record except the site registry.
    pub fn clear_activity(&self) {
        self.readings.clear();
        self.faults.clear();
        self.predictions.clear();
        self.maintenance.clear();
        self.evaluations.clear();
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

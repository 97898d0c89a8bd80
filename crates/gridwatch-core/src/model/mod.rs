// ── Unified domain model ──
//
// Every type in this module is the canonical representation of a gridwatch
// record. Detectors, services and the CLI all speak these types.

pub mod entity_id;

pub mod evaluation;
pub mod fault;
pub mod maintenance;
pub mod prediction;
pub mod site;
pub mod telemetry;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use gridwatch_core::model::*` gives you everything.

pub use entity_id::EntityId;

pub use evaluation::EvaluationResult;
pub use fault::{Fault, FaultStatus, FaultType, Severity};
pub use maintenance::{MaintenanceAction, MaintenanceStatus, Priority};
pub use prediction::{ConfidenceLevel, Prediction};
pub use site::{Site, SiteStatus, SiteType};
pub use telemetry::{BreakerStatus, Metric, RelayEvent, TelemetryReading};

/// A record the store can persist.
///
/// The store owns identity: records are built with
/// [`EntityId::unassigned()`] and receive a generated id on create.
pub trait Record: Clone + Send + Sync + 'static {
    /// Human-readable entity name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> &EntityId;

    fn assign_id(&mut self, id: EntityId);
}

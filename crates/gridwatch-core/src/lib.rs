//! Telemetry analysis core for gridwatch.
//!
//! This crate owns the domain model, the analysis pipeline and the reactive
//! data infrastructure for the gridwatch workspace:
//!
//! - **[`Monitor`]**: central facade managing one fleet.
//!   [`start()`](Monitor::start) spawns the recurring reading, countdown and
//!   prediction tasks plus the command processor; [`stop()`](Monitor::stop)
//!   cancels them. Every operation is also callable directly.
//!
//! - **[`Simulator`]**: synthetic SCADA telemetry with bounded fault
//!   scenarios and an autonomous fault mode, driven by a seeded RNG.
//!
//! - **[`DetectorBank`]**: ordered registry of rule-based detectors, each
//!   scoring the mean of one metric over the newest readings of a site.
//!
//! - **[`PredictionSynthesizer`]** / **[`RecommendationGenerator`]** /
//!   **[`Evaluator`]**: turn detector signals into predictions, predictions
//!   into costed maintenance actions, and history into scorecards.
//!
//! - **[`DataStore`]**: reactive in-memory storage built on
//!   `EntityCollection<T>` (`DashMap` + `tokio::sync::watch` channels),
//!   accessed by the services through the [`Repository`] trait.
//!
//! - **[`EntityStream<T>`]**: subscription handle vended by the `DataStore`.
//!
//! - **[`Command`]**: typed operator actions routed through an `mpsc`
//!   channel to the monitor's command processor.

pub mod clock;
pub mod command;
pub mod config;
pub mod detect;
pub mod error;
pub mod evaluate;
pub mod fleet;
pub mod model;
pub mod monitor;
pub mod predict;
pub mod recommend;
pub mod simulator;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandResult};
pub use config::MonitorConfig;
pub use detect::{BankRun, Detection, Detector, DetectorBank, Signal};
pub use error::CoreError;
pub use evaluate::{ConfusionMatrix, Evaluator};
pub use fleet::{CommsHealth, FleetSummary, HealthLevel, demo_fleet, risk_forecast};
pub use monitor::{Monitor, MonitorEvent, MonitorState};
pub use predict::{CycleReport, PredictionSynthesizer};
pub use recommend::{DuplicatePolicy, Recommendation, RecommendationGenerator, maintenance_queue};
pub use simulator::{FaultScenario, Simulator, SimulatorState};
pub use store::{DataStore, EntityCollection, Repository, SortOrder};
pub use stream::{EntityStream, FaultFilter, MaintenanceFilter, PredictionFilter, ReadingFilter};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BreakerStatus, ConfidenceLevel, EntityId, EvaluationResult, Fault, FaultStatus, FaultType,
    MaintenanceAction, MaintenanceStatus, Metric, Prediction, Priority, RelayEvent, Severity, Site,
    SiteStatus, SiteType, TelemetryReading,
};

// ── Command API ──
//
// Every operator action flows through a unified `Command` enum. The
// monitor's command processor applies each one against the simulator and
// the DataStore in arrival order.

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{
    EntityId, EvaluationResult, Fault, FaultStatus, MaintenanceAction, MaintenanceStatus,
    Prediction,
};
use crate::predict::CycleReport;
use crate::recommend::Recommendation;
use crate::simulator::FaultScenario;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All operator actions against a running monitor.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Simulator ────────────────────────────────────────────────────
    StartSimulator,
    PauseSimulator,
    ResetSimulator,
    ActivateScenario {
        scenario: FaultScenario,
    },
    SetAutoFault {
        enabled: bool,
    },

    // ── Analysis ─────────────────────────────────────────────────────
    RunPredictionCycle,
    Recommend {
        prediction_id: EntityId,
    },
    RunEvaluation,

    // ── Operator lifecycle ───────────────────────────────────────────
    UpdateMaintenanceStatus {
        id: EntityId,
        status: MaintenanceStatus,
    },
    UpdateFaultStatus {
        id: EntityId,
        status: FaultStatus,
    },
    LabelPrediction {
        id: EntityId,
        was_accurate: bool,
    },
}

/// Result of a command execution.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    /// The fault record created by a scenario activation, if any.
    ScenarioActivated(Option<Arc<Fault>>),
    Cycle(CycleReport),
    Recommendation(Recommendation),
    Evaluation(Arc<EvaluationResult>),
    Maintenance(Arc<MaintenanceAction>),
    Fault(Arc<Fault>),
    Prediction(Arc<Prediction>),
}

// ── Core error types ──
//
// User-facing errors from gridwatch-core. Persistence failures inside a
// cycle are logged and absorbed by the services; these variants surface
// only from operations a caller addressed directly.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Site not found: {site_id}")]
    SiteNotFound { site_id: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Scenario '{active}' is still active; wait for it to expire")]
    ScenarioActive { active: String },

    #[error("Cannot move {entity_type} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        from: String,
        to: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Monitor is not running")]
    MonitorStopped,

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Failed to persist {entity_type}: {message}")]
    Persistence {
        entity_type: String,
        message: String,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(entity_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn invalid_transition(
        entity_type: &str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity_type: entity_type.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use gridwatch_config::ConfigError;
use gridwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONFIG: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(gridwatch::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Pipeline ─────────────────────────────────────────────────────
    #[error("Scenario '{active}' is still active")]
    #[diagnostic(
        code(gridwatch::scenario_active),
        help("Only one scenario runs at a time; wait for it to expire.")
    )]
    ScenarioActive { active: String },

    #[error("Cannot move {entity_type} from {from} to {to}")]
    #[diagnostic(code(gridwatch::invalid_transition))]
    InvalidTransition {
        entity_type: String,
        from: String,
        to: String,
    },

    #[error("Monitor failure: {message}")]
    #[diagnostic(code(gridwatch::monitor))]
    Monitor { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gridwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists")]
    #[diagnostic(
        code(gridwatch::config_exists),
        help("Use --force to overwrite it.\nPath: {path}")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(gridwatch::config),
        help("Check the file shown by: gridwatch config path")
    )]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(gridwatch::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(gridwatch::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ScenarioActive { .. }
            | Self::InvalidTransition { .. }
            | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },

            CoreError::SiteNotFound { site_id } => CliError::NotFound {
                resource_type: "site".into(),
                identifier: site_id,
            },

            CoreError::ScenarioActive { active } => CliError::ScenarioActive { active },

            CoreError::InvalidTransition {
                entity_type,
                from,
                to,
            } => CliError::InvalidTransition {
                entity_type,
                from,
                to,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::MonitorStopped => CliError::Monitor {
                message: "monitor is not running".into(),
            },

            CoreError::Persistence {
                entity_type,
                message,
            } => CliError::Monitor {
                message: format!("failed to persist {entity_type}: {message}"),
            },

            CoreError::Internal(message) => CliError::Monitor { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let not_found: CliError = CoreError::NotFound {
            entity_type: "prediction".into(),
            identifier: "x".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let busy: CliError = CoreError::ScenarioActive {
            active: "overvoltage".into(),
        }
        .into();
        assert_eq!(busy.exit_code(), exit_code::CONFLICT);

        let invalid: CliError = CoreError::ValidationFailed {
            message: "bad".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);
        assert_eq!(
            CliError::from(CoreError::MonitorStopped).exit_code(),
            exit_code::GENERAL
        );
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err: CliError = ConfigError::Validation {
            field: "monitor.time_unit_ms".into(),
            reason: "must be greater than 0".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}

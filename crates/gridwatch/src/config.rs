//! CLI configuration: thin wrapper around `gridwatch_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--config, --seed).

use std::path::PathBuf;

use gridwatch_core::{MonitorConfig, Site};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use gridwatch_config::{Config, SiteProfile, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// The config file in effect: `--config` / `GRIDWATCH_CONFIG`, else the
/// platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(gridwatch_config::config_path)
}

/// Load the config in effect.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&config_path(global))?)
}

/// Build the monitor configuration and fleet, applying flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<(MonitorConfig, Vec<Site>), CliError> {
    let cfg = load(global)?;
    let mut monitor = cfg.monitor.to_monitor_config()?;
    if global.seed.is_some() {
        monitor.seed = global.seed;
    }
    let fleet = cfg.fleet()?;
    Ok((monitor, fleet))
}

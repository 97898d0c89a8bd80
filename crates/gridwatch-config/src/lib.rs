//! Shared configuration for gridwatch.
//!
//! TOML file + environment loading via figment, the site registry, and
//! translation to `gridwatch_core::MonitorConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridwatch_core::evaluate::{DEFAULT_HISTORY_SAMPLE, DEFAULT_PERIOD_DAYS};
use gridwatch_core::predict::MODEL_VERSION;
use gridwatch_core::store::DEFAULT_READING_RETENTION;
use gridwatch_core::{DuplicatePolicy, MonitorConfig, Site, SiteType, demo_fleet};

/// Prefix for environment overrides. Nested keys split on `__`,
/// e.g. `GRIDWATCH_MONITOR__SEED=7`.
pub const ENV_PREFIX: &str = "GRIDWATCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Pipeline cadences and tuning.
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Site registry. Empty means the built-in demo fleet.
    #[serde(default)]
    pub sites: Vec<SiteProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// The `[monitor]` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Length of one time unit in milliseconds.
    pub time_unit_ms: u64,
    pub reading_every: u32,
    pub prediction_every: u32,
    pub auto_fault: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub model_version: String,
    pub duplicate_recommendations: DuplicatePolicy,
    pub reading_retention: usize,
    pub prediction_sample: usize,
    pub evaluation_sample: usize,
    pub evaluation_period_days: u32,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            time_unit_ms: 1000,
            reading_every: 3,
            prediction_every: 30,
            auto_fault: false,
            seed: None,
            model_version: MODEL_VERSION.into(),
            duplicate_recommendations: DuplicatePolicy::default(),
            reading_retention: DEFAULT_READING_RETENTION,
            prediction_sample: 100,
            evaluation_sample: DEFAULT_HISTORY_SAMPLE,
            evaluation_period_days: DEFAULT_PERIOD_DAYS,
        }
    }
}

/// One `[[sites]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteProfile {
    /// Operator-facing site code, e.g. "SITE-001".
    pub site_id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub site_type: SiteType,
    #[serde(default)]
    pub capacity_mw: f64,
    #[serde(default)]
    pub inverter_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_date: Option<NaiveDate>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "gridwatch", "gridwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("gridwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is
/// not an error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl MonitorSection {
    /// Validate and build the runtime monitor configuration.
    pub fn to_monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        if self.time_unit_ms == 0 {
            return Err(invalid("monitor.time_unit_ms", "must be greater than 0"));
        }
        if self.prediction_sample == 0 {
            return Err(invalid("monitor.prediction_sample", "must be greater than 0"));
        }
        if self.reading_retention == 0 {
            return Err(invalid("monitor.reading_retention", "must be greater than 0"));
        }
        if self.model_version.trim().is_empty() {
            return Err(invalid("monitor.model_version", "must not be empty"));
        }

        Ok(MonitorConfig {
            time_unit: Duration::from_millis(self.time_unit_ms),
            reading_every: self.reading_every,
            prediction_every: self.prediction_every,
            auto_fault: self.auto_fault,
            seed: self.seed,
            model_version: self.model_version.clone(),
            duplicate_recommendations: self.duplicate_recommendations,
            reading_retention: self.reading_retention,
            prediction_sample: self.prediction_sample,
            evaluation_sample: self.evaluation_sample,
            evaluation_period_days: self.evaluation_period_days,
        })
    }
}

impl SiteProfile {
    pub fn to_site(&self) -> Site {
        let mut site = Site::new(self.site_id.as_str(), self.name.as_str(), self.site_type, Utc::now());
        site.location.clone_from(&self.location);
        site.capacity_mw = self.capacity_mw;
        site.inverter_count = self.inverter_count;
        site.commission_date = self.commission_date;
        site
    }
}

impl Config {
    /// The configured fleet, or the demo fleet when none is configured.
    /// Site codes must be non-empty and unique.
    pub fn fleet(&self) -> Result<Vec<Site>, ConfigError> {
        if self.sites.is_empty() {
            return Ok(demo_fleet(Utc::now()));
        }

        let mut seen = HashSet::new();
        for profile in &self.sites {
            if profile.site_id.trim().is_empty() {
                return Err(invalid("sites.site_id", "must not be empty"));
            }
            if !seen.insert(profile.site_id.as_str()) {
                return Err(invalid(
                    "sites.site_id",
                    format!("duplicate site '{}'", profile.site_id),
                ));
            }
        }
        Ok(self.sites.iter().map(SiteProfile::to_site).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    // Loading reads the process environment; every test that loads runs
    // inside a `Jail` so env overrides never leak between tests.

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let config = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(config.defaults.output, "table");
            assert_eq!(config.monitor, MonitorSection::default());
            assert!(config.sites.is_empty());
            assert_eq!(config.fleet().unwrap().len(), 5);
            Ok(())
        });
    }

    #[test]
    fn file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[monitor]
time_unit_ms = 250
auto_fault = true
seed = 9
duplicate_recommendations = "skip"

[[sites]]
site_id = "PV-1"
name = "Desert Array"
site_type = "solar"
capacity_mw = 40.0
commission_date = "2022-05-01"
"#,
            )?;

            let config = load_config_from(Path::new("config.toml")).unwrap();
            let monitor = config.monitor.to_monitor_config().unwrap();
            assert_eq!(monitor.time_unit, Duration::from_millis(250));
            assert!(monitor.auto_fault);
            assert_eq!(monitor.seed, Some(9));
            assert_eq!(monitor.duplicate_recommendations, DuplicatePolicy::Skip);
            assert_eq!(monitor.reading_every, 3);

            let fleet = config.fleet().unwrap();
            assert_eq!(fleet.len(), 1);
            assert_eq!(fleet[0].site_id, "PV-1");
            assert_eq!(fleet[0].commission_date, NaiveDate::from_ymd_opt(2022, 5, 1));
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[monitor]\nreading_every = 5\n")?;
            jail.set_env("GRIDWATCH_MONITOR__READING_EVERY", "7");
            jail.set_env("GRIDWATCH_DEFAULTS__OUTPUT", "json");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.monitor.reading_every, 7);
            assert_eq!(config.defaults.output, "json");
            Ok(())
        });
    }

    #[test]
    fn duplicate_site_codes_are_rejected() {
        let site = SiteProfile {
            site_id: "A".into(),
            name: "A".into(),
            location: String::new(),
            site_type: SiteType::Wind,
            capacity_mw: 0.0,
            inverter_count: 0,
            commission_date: None,
        };
        let config = Config {
            sites: vec![site.clone(), site],
            ..Config::default()
        };
        assert!(matches!(
            config.fleet(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn zero_time_unit_is_rejected() {
        let section = MonitorSection {
            time_unit_ms: 0,
            ..MonitorSection::default()
        };
        assert!(section.to_monitor_config().is_err());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.monitor.seed = Some(11);
        config.defaults.color = "never".into();
        save_config_to(&config, &path).unwrap();

        Jail::expect_with(|_| {
            let loaded = load_config_from(&path).unwrap();
            assert_eq!(loaded.monitor.seed, Some(11));
            assert_eq!(loaded.defaults.color, "never");
            Ok(())
        });
    }
}

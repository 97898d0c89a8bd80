//! Config subcommand handlers.

use chrono::Utc;

use gridwatch_config::ConfigError;
use gridwatch_core::{Site, demo_fleet};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, SiteProfile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn profile_for(site: &Site) -> SiteProfile {
    SiteProfile {
        site_id: site.site_id.clone(),
        name: site.name.clone(),
        location: site.location.clone(),
        site_type: site.site_type,
        capacity_mw: site.capacity_mw,
        inverter_count: site.inverter_count,
        commission_date: site.commission_date,
    }
}

/// A starter config: defaults plus the demo fleet spelled out so it can be edited.
fn starter_config() -> Config {
    Config {
        sites: demo_fleet(Utc::now()).iter().map(profile_for).collect(),
        ..Config::default()
    }
}

fn to_toml(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::from(ConfigError::from(e)))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::config_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&starter_config(), &path)?;
            if !global.quiet {
                eprintln!("Configuration written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = to_toml(&cfg)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| rendered.trim_end().to_owned(),
                |_| rendered.trim_end().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), false);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starter_config_round_trips_through_the_fleet() {
        let cfg = starter_config();
        assert_eq!(cfg.sites.len(), 5);
        let fleet = cfg.fleet().unwrap();
        assert_eq!(fleet[0].site_id, "SITE-001");
        assert_eq!(fleet[0].inverter_count, 48);
    }

    #[test]
    fn starter_config_renders_as_toml() {
        let rendered = to_toml(&starter_config()).unwrap();
        assert!(rendered.contains("[monitor]"));
        assert!(rendered.contains("[[sites]]"));
    }
}

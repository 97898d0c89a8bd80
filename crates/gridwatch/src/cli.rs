//! Clap derive structures for the `gridwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only clap and humantime may be used here: `build.rs` includes this file
//! to render man pages.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gridwatch -- SCADA telemetry analysis for solar and wind fleets
#[derive(Debug, Parser)]
#[command(
    name = "gridwatch",
    version,
    about = "Simulate SCADA telemetry, detect faults and plan maintenance",
    long_about = "Monitors a fleet of solar and wind sites from simulated SCADA telemetry.\n\n\
        Runs rule-based fault detectors over recent readings, turns their signals\n\
        into fault predictions, and recommends costed maintenance actions.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, env = "GRIDWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Seed for every random draw (overrides config)
    #[arg(long, env = "GRIDWATCH_SEED", global = true)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GRIDWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Injectable fault scenarios.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScenarioArg {
    Overvoltage,
    Undervoltage,
    FrequencyDrift,
    HarmonicSpike,
    InverterOverheat,
    ScadaLatency,
    DcInstability,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the live pipeline against the simulated fleet
    #[command(alias = "r")]
    Run(RunArgs),

    /// Run the detectors over readings from a JSON file
    #[command(alias = "a")]
    Analyze(AnalyzeArgs),

    /// List the fault detectors and their rules
    Detectors,

    /// List the injectable fault scenarios
    Scenarios,

    /// List the configured fleet
    Sites,

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RUN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Wall-clock time to run for (e.g. "90s", "5m")
    #[arg(long, short = 'd', default_value = "60s", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Time units per wall-clock second of the configured unit
    #[arg(long, short = 's', default_value = "1.0")]
    pub speed: f64,

    /// Inject random fault scenarios autonomously
    #[arg(long)]
    pub auto_faults: bool,

    /// Activate this scenario as soon as the run starts
    #[arg(long, value_enum)]
    pub scenario: Option<ScenarioArg>,

    /// Recommend maintenance for every prediction as it is made
    #[arg(long)]
    pub recommend: bool,

    /// Record an evaluation scorecard when the run ends
    #[arg(long)]
    pub evaluate: bool,

    /// Only report on this site code
    #[arg(long)]
    pub site: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ANALYZE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// JSON file holding an array of telemetry readings
    pub file: PathBuf,

    /// Also recommend maintenance for each prediction
    #[arg(long)]
    pub recommend: bool,

    /// Only report predictions for this site code
    #[arg(long)]
    pub site: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with defaults and the demo fleet
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! Command dispatch: bridges CLI args -> monitor operations -> output formatting.

pub mod analyze;
pub mod catalog;
pub mod config_cmd;
pub mod report;
pub mod run;
pub mod sites;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(args, global).await,
        Command::Analyze(args) => analyze::handle(args, global),
        Command::Detectors => catalog::detectors(global),
        Command::Scenarios => catalog::scenarios(global),
        Command::Sites => sites::handle(global),
        Command::Config(args) => config_cmd::handle(args, global),
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}

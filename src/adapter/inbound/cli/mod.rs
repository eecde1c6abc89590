//! CLI module graph.

pub mod app_data;
pub mod command;
pub mod config;
pub mod order;
pub mod output;
pub mod plan;
pub mod trigger;

use command::{AppDataCommand, Cli, Commands, TriggerCommand};

use crate::error::Result;

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns the handler's error; the binary maps it to exit code 1.
pub fn execute(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));
    match cli.command {
        Commands::CheckConfig { path } => config::execute_check(path),
        Commands::OrderHash { user, salt } => order::execute_hash(user, salt),
        Commands::Trigger(TriggerCommand::Encode { path }) => trigger::execute_encode(path),
        Commands::Trigger(TriggerCommand::Decode { data }) => trigger::execute_decode(&data),
        Commands::AppData(AppDataCommand::Hash { path }) => app_data::execute_hash(path),
        Commands::Plan { path, seeds } => plan::execute_plan(path, seeds),
    }
}

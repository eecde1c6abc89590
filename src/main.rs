use anyhow::Context;
use clap::Parser;
use lendflow::adapter::inbound::cli::command::{Cli, Commands};
use lendflow::adapter::inbound::cli::{self, output};
use lendflow::infrastructure::config::LoggingConfig;

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // stdout carries command output; diagnostics only when RUST_LOG asks
    LoggingConfig {
        level: "warn".into(),
        format: "pretty".into(),
    }
    .init();

    let name = command_name(&cli);
    cli::execute(cli).with_context(|| format!("{name} failed"))
}

fn command_name(args: &Cli) -> &'static str {
    match args.command {
        Commands::CheckConfig { .. } => "check-config",
        Commands::OrderHash { .. } => "order-hash",
        Commands::Trigger(_) => "trigger",
        Commands::AppData(_) => "app-data",
        Commands::Plan { .. } => "plan",
    }
}

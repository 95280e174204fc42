mod args;
mod handlers;

use anyhow::Result;
use clap::Parser;
use sessionlens_runtime::{Config, TelemetryService};
use tracing_subscriber::EnvFilter;

use args::{Cli, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Command::Detect) {
        return handlers::detect::run(cli.json);
    }

    let config = Config::load()?;
    let service = TelemetryService::new(&config)?;

    match cli.command {
        Command::Sessions { workspace, tool } => {
            handlers::sessions::run(&service, workspace.as_deref(), tool.as_deref(), cli.json)
        }
        Command::Show { session_id } => handlers::show::run(&service, &session_id, cli.json),
        Command::Messages {
            session_id,
            before,
            limit,
        } => handlers::messages::run(&service, &session_id, before, limit, cli.json),
        Command::Usage { days, refresh } => {
            handlers::usage::run(&service, days, refresh, cli.json)
        }
        Command::Detect => unreachable!("handled before config load"),
    }
}

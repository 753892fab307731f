mod cli;
mod commands;
#[cfg(test)]
mod fixtures;
mod model;
mod ranking;
mod search;
mod store;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

/// Used when `RUST_LOG` is unset or invalid. Keeps hyper's per-connection
/// chatter out of `serve` logs.
const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,hyper_util=warn";

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args),
        Commands::Query(args) => commands::query::run(args),
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

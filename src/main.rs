//! CLI entry point for cookie-relay.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Command, CookiesCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, "CLI arguments parsed");

    let store_path = cli.store_path.as_deref();
    match &cli.command {
        Command::Serve(args) => commands::run_serve_command(args, store_path).await,
        Command::Cookies { command } => match command {
            CookiesCommand::List(args) => commands::run_cookies_list_command(args, store_path).await,
            CookiesCommand::Set(args) => commands::run_cookies_set_command(args, store_path).await,
            CookiesCommand::Remove(args) => {
                commands::run_cookies_remove_command(args, store_path).await
            }
            CookiesCommand::Clear(args) => {
                commands::run_cookies_clear_command(args, store_path).await
            }
        },
        Command::Status => commands::run_status_command(store_path),
        Command::Heartbeat(args) => commands::run_heartbeat_command(args).await,
    }
}

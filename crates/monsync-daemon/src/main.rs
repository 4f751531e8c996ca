//! monsync daemon - keeps monitoring in sync with installed packages
//!
//! The daemon provides:
//! - Grafana dashboards per package, without clobbering user edits
//! - Prometheus file_sd targets per package
//! - Operator commands to inspect and reset what was synchronized

use clap::{Parser, Subcommand};
use monsync_daemon::{Daemon, DaemonConfig, DaemonError, DaemonResult};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// monsync daemon CLI
#[derive(Parser)]
#[command(name = "monsyncd")]
#[command(about = "monsync - DAppNode monitoring synchronization daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MONSYNC_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "MONSYNC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "MONSYNC_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Synchronize on an interval until interrupted (default)
    Run,

    /// Run one synchronization cycle and print its report
    SyncOnce,

    /// Inspect or reset the persisted state
    State {
        #[command(subcommand)]
        action: StateCommand,
    },

    /// Inspect the scrape-target files
    Targets {
        #[command(subcommand)]
        action: TargetsCommand,
    },
}

#[derive(Subcommand)]
enum StateCommand {
    /// Print every stored package record
    Show,

    /// Forget every package; the next cycle resynchronizes all of them
    Clear,
}

#[derive(Subcommand)]
enum TargetsCommand {
    /// Print the targets currently written per package
    List,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Initialize tracing
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let daemon = Daemon::new(config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => daemon.run().await,
        Command::SyncOnce => print_json(&daemon.sync_once().await?),
        Command::State { action } => match action {
            StateCommand::Show => print_json(&daemon.state().list().await?),
            StateCommand::Clear => {
                daemon.state().clear().await?;
                println!("State cleared");
                Ok(())
            }
        },
        Command::Targets { action } => match action {
            TargetsCommand::List => print_json(&daemon.targets().list_targets().await?),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> DaemonResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

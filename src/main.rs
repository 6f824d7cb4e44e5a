//! convlog - append-only conversation log
//!
#![doc = "Main entry point for the convlog command-line tool."]

use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use convlog::cli::{Cli, Commands};
use convlog::commands;
use convlog::config::{Config, LoggingConfig, DEFAULT_CONFIG_FILE};
use convlog::error::{exit_code_for, Result};

fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse_args();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
    let config = Config::load(config_path, &cli)?;

    init_tracing(&config.logging);

    if !Path::new(config_path).exists() {
        if config_path == DEFAULT_CONFIG_FILE {
            tracing::debug!("Config file not found at {}, using defaults", config_path);
        } else {
            tracing::warn!("Config file not found at {}, using defaults", config_path);
        }
    }

    // Validate configuration
    config.validate()?;

    let store = commands::open_store(&config);

    // Execute command
    match cli.command {
        Commands::Log {
            session_id,
            role,
            content,
        } => {
            if let Some(id) = &session_id {
                tracing::debug!("Appending to session {}", id);
            }
            commands::append::run_append(&store, session_id, role, content)?;
        }
        Commands::UpdateMemory {
            last_commit,
            message,
        } => {
            commands::update_memory::run_update_memory(&store, last_commit, message)?;
        }
        Commands::History { command } => {
            commands::history::handle_history(&store, command)?;
        }
        Commands::Memory => {
            commands::memory::show_memory(&store)?;
        }
    }

    Ok(())
}

/// Initialize tracing subscriber on stderr
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("convlog={}", config.level.to_lowercase())));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

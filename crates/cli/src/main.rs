//! Aula CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP chat service and chat page
//! - `chat`     — Interactive chat or single-message mode
//! - `students` — Inspect or extend the roster without the model
//! - `doctor`   — Diagnose config, roster file, and model backend
//! - `onboard`  — Write a default config and an empty roster

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "aula",
    about = "Aula — chat assistant for managing a student roster",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $AULA_CONFIG or ~/.aula/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat service
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep the roster in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Model to use for this session
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature for this session
        #[arg(short, long)]
        temperature: Option<f32>,
    },

    /// Query or extend the roster directly
    Students {
        #[command(subcommand)]
        action: commands::students::StudentsAction,
    },

    /// Diagnose system health
    Doctor,

    /// Initialize configuration and roster file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The service logs request traffic; interactive commands stay quiet.
    let default_level = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Serve { .. }, false) => "info",
        _ => "warn",
    };
    init_tracing(default_level, cli.log_json);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, ephemeral } => {
            commands::serve::run(config_path, port, ephemeral).await?
        }
        Commands::Chat {
            message,
            model,
            temperature,
        } => commands::chat::run(config_path, message, model, temperature).await?,
        Commands::Students { action } => commands::students::run(config_path, action).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
    }

    Ok(())
}

fn init_tracing(default_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

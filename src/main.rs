mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slotwatch::config::Config;

use commands::ResolveParams;

#[derive(Parser)]
#[command(
    name = "slotwatch",
    version,
    about = "Watch an appointment booking site for open slots and get notified",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug logging (overrides LOG_LEVEL)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log format (text, json); overrides LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Read settings from a TOML file instead of the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll until slots are found or interrupted (default)
    Watch,

    /// Run a single availability check and print the result
    Check,

    /// Look up exam and location ids by name
    Resolve {
        /// Exam name to resolve (defaults to EXAM_NAME)
        #[arg(long)]
        exam: Option<String>,

        /// Location name to resolve (defaults to LOCATION_NAME)
        #[arg(long)]
        location: Option<String>,

        /// List every exam and location instead of only the matches
        #[arg(long, default_value = "false")]
        list: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env().context("Configuration error")?,
    };

    if cli.debug {
        config.logging.level = String::from("debug");
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.to_lowercase();
    }

    // Initialize tracing/logging
    setup_tracing(
        &config.logging.format,
        &config.logging.level,
        config.logging.file.as_deref(),
    )?;

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => {
            tracing::info!(
                mode = %config.session_mode(),
                interval_secs = config.polling.interval_secs,
                jitter_secs = config.polling.jitter_secs,
                "Starting watch command"
            );
            let summary = commands::watch(config).await?;
            tracing::info!(stop_reason = ?summary.stop_reason, "slotwatch finished");
        }

        Commands::Check => {
            tracing::info!("Starting check command");
            commands::check(config).await?;
        }

        Commands::Resolve {
            exam,
            location,
            list,
        } => {
            tracing::info!(exam = ?exam, location = ?location, list = %list, "Starting resolve command");
            commands::resolve(
                config,
                ResolveParams {
                    exam,
                    location,
                    list,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, log_file: Option<&Path>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!("slotwatch={level},warn"))
        .with_context(|| format!("Invalid log level '{level}'"))?;

    let file = log_file
        .map(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map(Arc::new)
                .with_context(|| format!("Failed to open log file: {}", path.display()))
        })
        .transpose()?;

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .with(file.map(|f| {
                    tracing_subscriber::fmt::layer()
                        .with_writer(f)
                        .with_ansi(false)
                }))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .with(file.map(|f| {
                    tracing_subscriber::fmt::layer()
                        .with_writer(f)
                        .with_ansi(false)
                }))
                .init();
        }
    }

    Ok(())
}

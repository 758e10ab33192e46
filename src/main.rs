// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Corral: local-oracle file organizer

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{error, info, warn};

use corral::config::{AppConfig, OracleBackend};
use corral::oracle::ollama::model_matches;
use corral::oracle::{OllamaClient, ProcessOracle};
use corral::{CancelToken, OrganizeReport, Organizer, Strategy};

/// Corral CLI - sort a directory into folders with a local model
#[derive(Parser, Debug)]
#[command(name = "corral")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Organize files by extension, date, name similarity or intent", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Organize the files directly inside a directory
    Organize {
        /// Directory to organize
        directory: PathBuf,

        /// How to group files
        #[arg(short = 't', long = "type", value_enum, default_value_t = Strategy::Extension)]
        strategy: Strategy,

        /// Dry run mode (plan and report, move nothing)
        #[arg(long)]
        dry_run: bool,
    },

    /// Show oracle status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

    match cli.command {
        Commands::Organize { directory, strategy, dry_run } => {
            run_organize(config, directory, strategy, dry_run, cli.format).await
        }
        Commands::Status => run_status(config).await,
        Commands::Config { action } => run_config_command(config, action, &cli.config, cli.format),
    }
}

/// Run one organize pass on a background task, cancelled by Ctrl+C or SIGTERM
async fn run_organize(
    config: AppConfig,
    directory: PathBuf,
    strategy: Strategy,
    dry_run: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if dry_run {
        warn!("DRY RUN MODE - files will not be moved");
    }

    let organizer = Organizer::new(config).context("Failed to set up organizer")?;
    let (cancel_tx, cancel) = CancelToken::new();

    let mut task = tokio::spawn(async move {
        organizer.run(strategy, &directory, dry_run, &cancel).await
    });

    let terminate = async {
        #[cfg(unix)]
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }

        #[cfg(not(unix))]
        std::future::pending::<()>().await;
    };

    let joined = tokio::select! {
        joined = &mut task => joined,
        Ok(()) = signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping after the current file...");
            let _ = cancel_tx.send(true);
            task.await
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping after the current file...");
            let _ = cancel_tx.send(true);
            task.await
        }
    };

    let report = joined.context("Organize task failed")??;
    print_report(&report, format)?;
    Ok(())
}

fn print_report(report: &OrganizeReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            let verb = if report.dry_run { "Would move" } else { "Moved" };
            for planned in &report.moves {
                let shown = planned
                    .destination()
                    .strip_prefix(&report.directory)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| planned.destination());
                let name = planned
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("{}: {} -> {}", verb, name, shown.display());
            }
            for failed in &report.failed {
                println!("Failed: {}", failed.display());
            }

            println!(
                "\n{} {} of {} files by {}{}",
                verb,
                report.moves.len(),
                report.scanned,
                report.strategy,
                if report.cancelled { " (cancelled)" } else { "" }
            );
            if !report.left_in_place.is_empty() {
                println!("Left in place: {}", report.left_in_place.len());
            }
        }
    }
    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> anyhow::Result<()> {
    let oracle = &config.oracle;

    println!("Corral v{} Status", env!("CARGO_PKG_VERSION"));
    println!("==================");
    println!("Model: {}", oracle.model);
    println!("Timeout: {}s", oracle.timeout_secs);

    match oracle.backend {
        OracleBackend::Process => {
            let process = ProcessOracle::new(oracle);
            println!("Backend: process ({} {})", process.command(), oracle.args.join(" "));
            if process.is_installed().await {
                println!("{}: Installed", process.command());
            } else {
                bail!("{} was not found on PATH", process.command());
            }
        }
        OracleBackend::Http => {
            let client = OllamaClient::new(oracle)?;
            println!("Backend: http ({})", client.base_url());

            client
                .health_check()
                .await
                .context("Ollama is not reachable")?;
            println!("Ollama: Running");

            let models = client.list_models().await?;
            println!("\nAvailable models:");
            for m in &models {
                let marker = if model_matches(m, &oracle.model) { "→" } else { " " };
                println!("  {} {}", marker, m);
            }
            if !models.iter().any(|m| model_matches(m, &oracle.model)) {
                warn!("Model '{}' not found. Try: ollama pull {}", oracle.model, oracle.model);
            }
        }
    }

    Ok(())
}

/// Run config commands
fn run_config_command(
    config: AppConfig,
    action: ConfigCommands,
    config_path: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            // load() already validated; report what will be used.
            if format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "path": config_path, "valid": true }));
            } else {
                println!("Configuration at {:?} is valid", config_path);
                println!("  Oracle: {:?} / {}", config.oracle.backend, config.oracle.model);
                println!("  Categories: {}", config.categories.len());
                println!("  Miscellaneous folder: {}", config.rules.misc_folder);
            }
        }
    }

    Ok(())
}

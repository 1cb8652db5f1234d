use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use gallery::{commands, config, viewer};

// Default Configuration Constants
/// Default log level when not specified
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log file path (no logging to file)
const DEFAULT_LOG_FILE: &str = "/dev/null";

/// Default dataset file
const DEFAULT_TEAMS_FILE: &str = "teams.toml";

#[derive(Parser)]
#[command(name = "gallery")]
#[command(about = "Team photo contest gallery", long_about = "Team photo contest gallery\n\nIf no command is specified, the program starts the interactive viewer.")]
struct Cli {
    /// Set log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Log file path (default: /dev/null for no logging)
    #[arg(short = 'F', long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: String,

    /// Teams dataset (TOML with [[teams]] entries)
    #[arg(short = 't', long, global = true, default_value = DEFAULT_TEAMS_FILE)]
    teams: PathBuf,

    /// Directory image URLs are resolved against
    #[arg(short = 'i', long, global = true, default_value = ".")]
    images_dir: PathBuf,

    /// Initial address, e.g. "/?team=2&photo=3"
    #[arg(short = 'u', long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List teams in the dataset
    Teams {
        /// Verify every photo can be read from the images directory
        #[arg(short, long)]
        check: bool,
    },
    /// Display contest statistics
    Stats,
    /// Display current configuration
    Config,
}

fn init_logging(log_level: &str, log_file: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_file, e);
            return;
        }
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Handle the config command - display current configuration
fn handle_config_command() {
    let cfg = config::read();

    let (path_str, exists) = match config::get_config_path() {
        Some(path) => {
            let exists = path.exists();
            (path.display().to_string(), exists)
        }
        None => ("Unable to determine config path".to_string(), false),
    };

    println!("Configuration File: {} (Exists: {})", path_str, if exists { "yes" } else { "no" });
    println!();
    println!("Current Configuration:");
    println!("=====================");
    println!("log_level: {}", cfg.log_level);
    println!("log_file: {}", cfg.log_file);
    println!("max_concurrent_loads: {}", cfg.max_concurrent_loads);
    println!("max_cache_entries: {}", cfg.max_cache_entries);
    println!("preload_neighbor_radius: {}", cfg.preload_neighbor_radius);
    println!("preview_quality: {}", cfg.preview_quality);
    println!("lazy_margin: {} rows", cfg.lazy_margin);
    println!(
        "vote_url: {}",
        if cfg.vote_url.is_empty() { "(voting disabled)" } else { cfg.vote_url.as_str() }
    );
    println!("base_path: {}", cfg.base_path);
}

/// Resolve log configuration from CLI args and config file
/// CLI arguments take precedence over config file
fn resolve_log_config<'a>(cli: &'a Cli, config: &'a config::Config) -> (&'a str, &'a str) {
    let log_level = if cli.log_level != DEFAULT_LOG_LEVEL {
        cli.log_level.as_str()
    } else {
        config.log_level.as_str()
    };

    let log_file = if cli.log_file != DEFAULT_LOG_FILE {
        cli.log_file.as_str()
    } else {
        config.log_file.as_str()
    };

    (log_level, log_file)
}

/// Load the dataset and start the interactive viewer
async fn run_viewer(cli: Cli, config: config::Config) -> anyhow::Result<()> {
    let dataset = commands::load_dataset(&cli.teams)?;
    viewer::run(dataset, config, cli.images_dir, cli.url)
        .await
        .context("Terminal error")
}

/// Execute a CLI command by routing it to the appropriate command handler
async fn execute_command(cli: &Cli, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Config => unreachable!("Config command should be handled before execute_command"),
        Commands::Teams { check } => {
            let dataset = commands::load_dataset(&cli.teams)?;
            commands::teams::run(&dataset, &cli.images_dir, check).await
        }
        Commands::Stats => {
            let dataset = commands::load_dataset(&cli.teams)?;
            commands::stats::run(&dataset)
        }
    }
}

#[tokio::main]
async fn main() {
    let config = config::read();
    let mut cli = Cli::parse();

    // Resolve and initialize logging
    let (log_level, log_file) = resolve_log_config(&cli, &config);
    if log_file != DEFAULT_LOG_FILE {
        init_logging(log_level, log_file);
    }

    // If no subcommand, run the viewer
    let Some(command) = cli.command.take() else {
        if let Err(e) = run_viewer(cli, config).await {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    };

    // Handle Config command separately (doesn't need the dataset)
    if let Commands::Config = command {
        handle_config_command();
        return;
    }

    if let Err(e) = execute_command(&cli, command).await {
        eprintln!("Error: {:#}", e);
        tracing::error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}

//! ATR stop calibration - main entry point
//!
//! This binary provides three subcommands:
//! - calibrate: Calibrate every instrument file in a directory and write the result table
//! - analyze: Calibrate a single instrument file and print the details
//! - config: Print the effective configuration as JSON

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "stop-calibrator")]
#[command(about = "ATR stop-coefficient calibration and take-profit duration analysis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to JSON configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calibrate every instrument in the data directory
    Calibrate {
        /// Directory with one file per instrument (overrides config)
        #[arg(short, long)]
        data_dir: Option<String>,

        /// Output CSV path (overrides config)
        #[arg(short, long)]
        output: Option<String>,

        /// Instrument file extension, without the dot (overrides config)
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Calibrate one instrument file and print the details
    Analyze {
        /// Path to the instrument file
        #[arg(short, long)]
        file: String,
    },

    /// Print the effective configuration as JSON
    #[command(name = "config")]
    ShowConfig,
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // File appender
    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // For calibrate: only log to file, keep console clean for progress and table
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        // File layer - same format but without ANSI colors
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Calibrate { .. } => ("calibrate", true),
        Commands::Analyze { .. } => ("analyze", false),
        Commands::ShowConfig => ("config", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Calibrate {
            data_dir,
            output,
            extension,
        } => commands::calibrate::run(cli.config, data_dir, output, extension),

        Commands::Analyze { file } => commands::analyze::run(cli.config, file),

        Commands::ShowConfig => commands::show_config(cli.config),
    }
}

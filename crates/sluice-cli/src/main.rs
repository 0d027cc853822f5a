//! `sluice` - check and simulate pipeline rules from the command line

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sluice_sdk::EngineConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Validate and simulate pipeline rules", long_about = None)]
struct Cli {
    /// Engine configuration file (YAML or TOML); defaults to config/sluice
    #[arg(short, long, global = true, env = "SLUICE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rule and pipeline files and print every diagnostic
    Check {
        /// `.rule` and `.pipeline` files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Run a message through the rules of a directory
    Simulate {
        /// Directory holding *.rule, *.pipeline and connections.yaml
        #[arg(short, long)]
        rules: PathBuf,
        /// Message as a JSON object, or @path to read it from a file
        #[arg(short, long)]
        message: String,
        /// Run only this pipeline instead of routing by stream
        #[arg(short, long)]
        pipeline: Option<String>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns false when the inputs had problems
fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };
    tracing::debug!(?config, "configuration loaded");

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Check { files } => commands::check(&files, config, &mut stdout),
        Commands::Simulate {
            rules,
            message,
            pipeline,
        } => {
            let message = commands::read_message_arg(&message)?;
            commands::simulate(&rules, &message, pipeline.as_deref(), config, &mut stdout)
        }
    }
}

/// Initialize tracing subscriber, logging to stderr
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice=info,sluice_sdk=info,sluice_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

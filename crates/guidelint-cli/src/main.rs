//! guidelint CLI tool.
//!
//! Usage:
//! ```bash
//! guidelint check [OPTIONS] [PATH]
//! guidelint list-rules [--preset NAME]
//! guidelint init [--force]
//! ```
//!
//! Exit status: 0 clean or warnings only, 1 MUST violations, 2 fatal error.

use clap::{Parser, Subcommand};
use guidelint_core::EngineError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;
mod sources;

/// Style-guide compliance checker for Svelte + TypeScript projects
#[derive(Parser)]
#[command(name = "guidelint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a project against the style guide
    Check(commands::check::CheckArgs),

    /// List available rules
    ListRules {
        /// Show the rules as selected by this preset
        #[arg(long)]
        preset: Option<String>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON report.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            report_fatal(err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Check(args) => {
            let source = config_resolver::resolve(&args.path, cli.config.as_deref());
            commands::check::run(args, &source)
        }
        Commands::ListRules { preset } => {
            commands::list_rules::run(preset.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(std::path::Path::new("."), *force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Engine errors carry diagnostic codes and help; everything else is
/// rendered with its context chain.
fn report_fatal(err: anyhow::Error) {
    let report = match err.downcast::<EngineError>() {
        Ok(engine) => miette::Report::new(engine),
        Err(other) => miette::miette!("{other:#}"),
    };
    eprintln!("{report:?}");
}

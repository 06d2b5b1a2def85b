//! armlint CLI tool.
//!
//! Usage:
//! ```bash
//! armlint check [OPTIONS] [PATH]...
//! armlint list-rules
//! armlint init
//! ```

use anyhow::Result;
use armlint_core::{OpenApiType, Severity};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Linter for multi-file OpenAPI (Swagger) specifications following ARM conventions
#[derive(Parser)]
#[command(name = "armlint")]
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
    /// Lint specification files or directories
    Check {
        /// Files or directories to lint (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific rules, by name or id (comma-separated)
        #[arg(long)]
        rules: Option<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Rule preset: arm, dataplane or all
        #[arg(long)]
        preset: Option<String>,

        /// Kind of API: default, arm, dataplane or rpaas
        #[arg(long)]
        openapi_type: Option<OpenApiType>,

        /// Lowest severity that fails the run: info, warning or error
        #[arg(long)]
        fail_on: Option<Severity>,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-diagnostic compact format.
    Compact,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    armlint_core::quiet_rule_panics();

    match cli.command {
        Commands::Check {
            paths,
            format,
            rules,
            exclude,
            preset,
            openapi_type,
            fail_on,
        } => {
            let options = commands::check::CheckOptions {
                paths,
                format,
                rules,
                exclude,
                preset,
                openapi_type,
                fail_on,
            };
            let failed = commands::check::run(&options, cli.config.as_deref())?;
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

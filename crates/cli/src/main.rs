//! Lexigrade CLI — the main entry point.
//!
//! Commands:
//! - `grade`    — Grade a request, optionally reconciling enrichment text
//! - `extract`  — Recover JSON from model text and show how it was found
//! - `catalog`  — Show the study-material catalog
//! - `config`   — Show the effective or default configuration
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "lexigrade",
    about = "Lexigrade — exam grading with reconciled model enrichment",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.lexigrade/config.toml)
    #[arg(long, global = true, env = "LEXIGRADE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a request JSON file
    Grade {
        /// GradeRequest JSON file
        #[arg(short, long)]
        request: PathBuf,

        /// Raw enrichment text returned by the analysis service
        #[arg(short, long)]
        enrichment: Option<PathBuf>,

        /// The enrichment file is a provider response body; unwrap its text first
        #[arg(long, requires = "enrichment")]
        envelope: bool,

        /// Report that fetching enrichment failed with this message
        #[arg(long, conflicts_with = "enrichment")]
        upstream_error: Option<String>,

        /// Include extraction strategy, merge provenance, and material rewrites
        #[arg(long)]
        audit: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Extract JSON from a model text file
    Extract {
        /// Text file to extract from
        #[arg(short, long)]
        input: PathBuf,

        /// The input is a provider response body; unwrap its text first
        #[arg(long)]
        envelope: bool,
    },

    /// Show the material catalog
    Catalog {
        /// Show only the materials a skill resolves to
        #[arg(short, long)]
        skill: Option<String>,
    },

    /// Show configuration
    Config {
        /// Print the built-in defaults instead of the effective config
        #[arg(long)]
        show_default: bool,

        /// Print the config file path
        #[arg(long, conflicts_with = "show_default")]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries results only
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Grade {
            request,
            enrichment,
            envelope,
            upstream_error,
            audit,
            pretty,
        } => {
            let args = commands::grade::GradeArgs {
                request,
                enrichment,
                envelope,
                upstream_error,
                audit,
                pretty,
            };
            commands::grade::run(config_path, args).await?
        }
        Commands::Extract { input, envelope } => {
            commands::extract::run(config_path, &input, envelope).await?
        }
        Commands::Catalog { skill } => commands::catalog::run(config_path, skill.as_deref())?,
        Commands::Config { show_default, path } => {
            if show_default {
                commands::config_cmd::show_default()?
            } else if path {
                commands::config_cmd::path(config_path)?
            } else {
                commands::config_cmd::show(config_path)?
            }
        }
    }

    Ok(())
}

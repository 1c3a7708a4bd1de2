//! Binary entry point for surrealvec.
//!
//! This binary provides the CLI interface for the SurrealDB vector store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use surrealvec::cli::{self, Backend, OutputFormat, SearchArgs};
use surrealvec::config::SurrealvecConfig;
use surrealvec::observability::{self, InitOptions};

/// Surrealvec - a SurrealDB vector store.
#[derive(Parser)]
#[command(name = "surrealvec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "SURREALVEC_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Run against a throwaway in-process database instead of the server.
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Define the vector index if it does not exist.
    InitSchema,

    /// Add documents from a JSON file.
    Add {
        /// JSON array of documents.
        #[arg(short, long)]
        file: PathBuf,

        /// Write all documents in one transaction.
        #[arg(long)]
        batched: bool,
    },

    /// Search for similar documents.
    Search {
        #[command(flatten)]
        args: SearchArgs,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the statements a search would send, without running it.
    Explain {
        #[command(flatten)]
        args: SearchArgs,
    },

    /// Delete documents by id.
    Delete {
        /// Document ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Compile filter text to a SurrealQL condition.
    RenderFilter {
        /// Filter text, e.g. "genre == 'drama' && year >= 2020".
        filter: String,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) =
        observability::init_from_settings(&config.logging, InitOptions { verbose: cli.verbose })
    {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &SurrealvecConfig) -> Result<()> {
    let backend = if cli.in_memory {
        Backend::InMemory
    } else {
        Backend::Http
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::InitSchema => {
            cli::cmd_init_schema(config, backend, &mut out).context("schema initialization failed")?;
        },

        Commands::Add { file, batched } => {
            let store = cli::build_store(config, backend, false)?;
            cli::cmd_add(&store, &file, batched, &mut out)
                .with_context(|| format!("failed to add documents from {}", file.display()))?;
        },

        Commands::Search { args, json } => {
            let store = cli::build_store(config, backend, false)?;
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            cli::cmd_search(&store, &args, format, &mut out).context("search failed")?;
        },

        Commands::Explain { args } => {
            let store = cli::build_store(config, backend, false)?;
            cli::cmd_explain(&store, &args, &mut out)?;
        },

        Commands::Delete { ids } => {
            let store = cli::build_store(config, backend, false)?;
            cli::cmd_delete(&store, &ids, &mut out).context("delete failed")?;
        },

        Commands::RenderFilter { filter } => {
            cli::cmd_render_filter(&filter, &mut out)?;
        },
    }

    out.flush().context("failed to flush output")
}

/// Loads configuration, then applies `SURREALVEC_*` overrides.
fn load_config(path: Option<&Path>) -> Result<SurrealvecConfig> {
    let config = match path {
        Some(path) => SurrealvecConfig::load_from_file(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        None => SurrealvecConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}

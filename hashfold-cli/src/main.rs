//! hashfold - Merkle root and inclusion proof tool
//!
//! Reads a newline-separated record file, hashes every record into a leaf
//! and folds the leaves into a single SHA-256 Merkle root.

mod commands;
mod config;
mod records;

use crate::config::Config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hashfold", version, about = "Compute Merkle roots and inclusion proofs over record files")]
struct Cli {
    /// Log filter (overrides RUST_LOG and HASHFOLD_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to a new file instead of stderr (overrides HASHFOLD_LOG_FILE)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the Merkle root of a record file
    Root {
        /// Record file, one record per line
        file: PathBuf,

        /// Print every layer of the tree, leaves first
        #[arg(long)]
        layers: bool,
    },

    /// Print the inclusion proof for one record
    Proof {
        /// Record file, one record per line
        file: PathBuf,

        /// Zero-based record index
        #[arg(long, short)]
        index: usize,

        /// Emit the proof as JSON
        #[arg(long)]
        json: bool,

        /// Write the JSON proof to this file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Check a JSON inclusion proof for a record against a root
    Verify {
        /// The record text
        #[arg(long, required_unless_present = "record_hex", conflicts_with = "record_hex")]
        record: Option<String>,

        /// The record bytes as hex, for records that are not valid UTF-8
        #[arg(long)]
        record_hex: Option<String>,

        /// Proof file produced by `hashfold proof --json`
        #[arg(long)]
        proof: PathBuf,

        /// Expected root as hex
        #[arg(long)]
        root: String,
    },
}

fn init_tracing(config: &Config) -> Result<()> {
    // RUST_LOG is already folded into config.log_level below the flag
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid log level: {}", config.log_level))?;

    match &config.log_file {
        Some(path) => {
            let file = create_log_file(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Log files are never appended to or overwritten
fn create_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Root { file, layers } => commands::root::handle(&file, layers).map(|_| ()),
        Commands::Proof {
            file,
            index,
            json,
            out,
        } => commands::proof::handle(&file, index, json, out.as_deref()).map(|_| ()),
        Commands::Verify {
            record,
            record_hex,
            proof,
            root,
        } => {
            let record = commands::verify::record_bytes(record.as_deref(), record_hex.as_deref())?;
            commands::verify::handle(&record, &proof, &root)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.log_level.clone(), cli.log_file.clone());

    if let Err(e) = init_tracing(&config) {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(2);
    }

    tracing::debug!(?config, "Starting hashfold");

    if let Err(e) = run(cli) {
        tracing::error!("{:#}", e);
        eprintln!("{} {}", "✗".red().bold(), format!("{:#}", e).red());
        std::process::exit(1);
    }
}

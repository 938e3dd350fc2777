//! casedb command-line tool.
//!
//! Imports cases into a local store and runs projections, reference queries
//! and cache key lookups against it.

mod commands;
mod error;
mod formatter;

use std::path::{Path, PathBuf};

use casedb_core::{CaseStore, InstanceConfig, StorageConfig};
use clap::{Parser, Subcommand};
use formatter::OutputFormat;
use tracing::debug;
use tracing_subscriber::filter::{Directive, LevelFilter};

use crate::error::CliError;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// casedb command-line tool
#[derive(Parser, Debug)]
#[command(name = "casedb")]
#[command(version, about = "Query a case store as a tree")]
pub struct Args {
    /// Store directory
    #[arg(short = 'd', long, default_value = "./casedb_data")]
    pub data_dir: PathBuf,

    /// Instance configuration file (JSON)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load cases from a JSON array file
    Import {
        /// File holding `[{"id": .., "columns": {..}, "indices": {..}}, ..]`
        file: PathBuf,
    },
    /// Select children by the predicates on a reference's last segment
    Query {
        /// Reference such as `/casedb/case[@case-in-parent='H1'][@status='open']`
        reference: String,
    },
    /// Show whether a reference is cacheable and the id it maps to
    CacheKey {
        /// Reference such as `/casedb/case[3]`
        reference: String,
    },
    /// Project the store and print engine counters
    Stats,
}

fn main() {
    // Initialize tracing
    let directive: Directive = "casedb_cli=info"
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<String, CliError> {
    let config = load_config(args.config.as_deref())?;
    let store = CaseStore::open(StorageConfig::new(&args.data_dir))?;
    let formatter = formatter::create_formatter(args.format);

    debug!(data_dir = %args.data_dir.display(), records = store.len(), "Opened store");

    match args.command {
        Command::Import { file } => commands::import(&store, &file, &*formatter),
        Command::Query { reference } => commands::query(store, config, &reference, &*formatter),
        Command::CacheKey { reference } => {
            commands::cache_key(store, config, &reference, &*formatter)
        }
        Command::Stats => commands::stats(store, config),
    }
}

fn load_config(path: Option<&Path>) -> Result<InstanceConfig, CliError> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(InstanceConfig::default()),
    }
}

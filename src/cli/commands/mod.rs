//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod extract;
mod ingest;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::reference::ReferenceData;

#[derive(Parser)]
#[command(name = "histdoc")]
#[command(about = "Historical document ingestion and entity extraction")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./histdoc.toml when present)
    #[arg(short, long, global = true, env = "HISTDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest PDFs from the manifest (or the PDF directory) into the store
    Ingest {
        /// Manifest of source records (overrides config)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// PDF cache and scan directory (overrides config)
        #[arg(long)]
        pdf_dir: Option<PathBuf>,
        /// Items per batch
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Concurrent workers within a batch
        #[arg(short, long)]
        workers: Option<usize>,
        /// Recreate the index before ingesting
        #[arg(long)]
        force_reindex: bool,
        /// Only ingest PDFs already in the PDF directory
        #[arg(long)]
        local_only: bool,
        /// Process at most this many items
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check whether a PDF passes validation
    Validate {
        /// PDF file to check
        pdf: PathBuf,
    },

    /// Extract text, metadata and entities from one PDF
    Extract {
        /// PDF file to read
        pdf: PathBuf,
        /// Print the enriched document as JSON
        #[arg(long, conflicts_with = "pages")]
        json: bool,
        /// Print the cleaned text of each page
        #[arg(long)]
        pages: bool,
    },

    /// Load and validate the reference datasets
    CheckConfig,

    /// Manage the search index
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },

    /// Print a stored document as JSON
    Get {
        /// Document id
        id: String,
    },

    /// Delete a stored document
    Delete {
        /// Document id
        id: String,
    },

    /// Run a search query against the store
    Search {
        /// Query as JSON, e.g. '{"q": "sesmaria", "size": 5}' for local stores
        query: String,
    },
}

#[derive(Subcommand)]
enum IndexCommands {
    /// Create the index with its field mappings
    Init {
        /// Delete and recreate an existing index
        #[arg(long)]
        force: bool,
    },
    /// Show store health
    Health,
}

/// Load reference data or abort. Nothing is processed without it.
fn load_reference(settings: &Settings) -> anyhow::Result<Arc<ReferenceData>> {
    let dir = &settings.reference_dir;
    let data = ReferenceData::load(dir)
        .with_context(|| format!("Failed to load reference data from {}", dir.display()))?;
    Ok(Arc::new(data))
}

async fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    Settings::load(config).await.map_err(anyhow::Error::msg)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Ingest {
            manifest,
            pdf_dir,
            batch_size,
            workers,
            force_reindex,
            local_only,
            limit,
        } => {
            if let Some(manifest) = manifest {
                settings.manifest = manifest;
            }
            if let Some(pdf_dir) = pdf_dir {
                settings.pdf_dir = pdf_dir;
            }
            let reference = load_reference(&settings)?;
            let args = ingest::IngestArgs {
                batch_size,
                workers,
                force_reindex,
                local_only,
                limit,
            };
            ingest::cmd_ingest(&settings, reference, args).await
        }
        Commands::Validate { pdf } => extract::cmd_validate(&settings, &pdf).await,
        Commands::Extract { pdf, json, pages } => {
            let reference = load_reference(&settings)?;
            extract::cmd_extract(&settings, reference, &pdf, json, pages).await
        }
        Commands::CheckConfig => check::cmd_check_config(&settings).await,
        Commands::Index { command } => match command {
            IndexCommands::Init { force } => store::cmd_index_init(&settings, force).await,
            IndexCommands::Health => store::cmd_index_health(&settings).await,
        },
        Commands::Get { id } => store::cmd_get(&settings, &id).await,
        Commands::Delete { id } => store::cmd_delete(&settings, &id).await,
        Commands::Search { query } => store::cmd_search(&settings, &query).await,
    }
}

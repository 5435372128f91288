//! # Portfolio RAG CLI (`folio`)
//!
//! ## Usage
//!
//! ```bash
//! folio --config ./config/folio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio index` | Chunk and embed the source feed into the corpus artifact |
//! | `folio retrieve "<query>"` | Print the context block for a query |
//! | `folio ask "<question>"` | Answer a question with retrieved context |
//! | `folio serve` | Start the HTTP chat server |
//! | `folio stats` | Summarize the corpus artifact |
//!
//! ## Examples
//!
//! ```bash
//! # Preview how the feed will be chunked
//! folio index --dry-run
//!
//! # Rebuild the corpus with four requests in flight
//! folio index --concurrency 4
//!
//! # Show ranked matches with similarity scores
//! folio retrieve "distributed systems" --explain
//!
//! # Serve POST /api/chat for the portfolio site
//! folio serve --config ./config/folio.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use portfolio_rag::{config, index_cmd, logging, retrieve_cmd, server, stats};

/// Portfolio RAG CLI: retrieval-augmented chat over portfolio content.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/folio.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "folio",
    about = "Portfolio RAG: index portfolio content and answer questions about it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/folio.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the corpus artifact from the source feed.
    ///
    /// Every document is split into sentence-aligned chunks and each chunk
    /// is embedded. The artifact is replaced only when every chunk
    /// succeeds.
    Index {
        /// Chunk only: print per-document chunk counts without embedding
        /// or writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Override `[embedding] concurrency` (requests in flight).
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Print the context block retrieved for a query.
    Retrieve {
        /// The query text.
        query: String,

        /// Number of records to keep (overrides `[retrieval] top_k`).
        #[arg(long)]
        k: Option<usize>,

        /// Context size in characters (overrides `[retrieval] char_budget`).
        #[arg(long)]
        budget: Option<usize>,

        /// Print ranked records with similarity scores instead of the
        /// context block.
        #[arg(long)]
        explain: bool,
    },

    /// Answer a question using retrieved context and the completion model.
    Ask {
        /// The question text.
        question: String,
    },

    /// Start the HTTP chat server on `[server] bind`.
    Serve,

    /// Summarize the corpus artifact.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index {
            dry_run,
            concurrency,
        } => {
            index_cmd::run_index(&cfg, dry_run, concurrency).await?;
        }
        Commands::Retrieve {
            query,
            k,
            budget,
            explain,
        } => {
            retrieve_cmd::run_retrieve(&cfg, &query, k, budget, explain).await?;
        }
        Commands::Ask { question } => {
            retrieve_cmd::run_ask(&cfg, &question).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
    }

    Ok(())
}

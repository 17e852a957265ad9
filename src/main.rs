//! cindex CLI - offline codebase indexing and context retrieval.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cindex::{default_db_path, Container, IndexMode, RetrievalHints};

/// cindex - codebase graph indexing and ranked context retrieval
#[derive(Parser)]
#[command(name = "cindex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the store file (overrides CINDEX_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a repository (incremental when already indexed)
    Index {
        /// Path to the repository root
        path: String,

        /// Force a mode instead of auto-detecting: full or incremental
        #[arg(short, long)]
        mode: Option<String>,

        /// Index level (0 or 1; recorded, no behavioural effect)
        #[arg(short, long, default_value = "0")]
        level: u8,
    },

    /// Show index status for a repository
    Status {
        /// Path to the repository root
        path: String,
    },

    /// Full-text search over indexed paths and symbols
    Search {
        /// Path to the repository root
        path: String,

        /// The search query
        query: String,

        /// Maximum number of results (1-100)
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Print a line range of a file
    Snippet {
        /// Path to the repository root
        path: String,

        /// Repo-relative file path
        file: String,

        /// First line (1-based, inclusive)
        #[arg(short, long)]
        start: Option<u32>,

        /// Last line (1-based, inclusive)
        #[arg(short, long)]
        end: Option<u32>,
    },

    /// Build a context bundle for a task description
    Context {
        /// Path to the repository root
        path: String,

        /// Natural-language task description
        task: String,

        /// Snippet token budget (100-50000)
        #[arg(short, long)]
        budget: Option<u32>,

        /// Hint: repo-relative paths known to matter (repeatable)
        #[arg(long = "hint-path")]
        hint_paths: Vec<String>,

        /// Hint: symbol names known to matter (repeatable)
        #[arg(long = "hint-symbol")]
        hint_symbols: Vec<String>,
    },

    /// Start the MCP (Model Context Protocol) server on stdio
    Mcp,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over the verbose flag.
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db_path = cli.db_path.unwrap_or_else(default_db_path);
    let container = Container::new(&db_path)?;

    match cli.command {
        Commands::Index { path, mode, level } => {
            let mode = match mode.as_deref() {
                None => None,
                Some(raw) => Some(
                    IndexMode::parse(raw)
                        .ok_or_else(|| anyhow::anyhow!("Invalid mode: {}", raw))?,
                ),
            };
            let summary = container
                .index_use_case()
                .execute(std::path::Path::new(&path), mode, level)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Status { path } => {
            let status = container
                .status_use_case()
                .execute(std::path::Path::new(&path))
                .await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::Search { path, query, limit } => {
            let results = container
                .search_use_case()
                .execute(std::path::Path::new(&path), &query, Some(limit))
                .await?;
            if results.is_empty() {
                println!("No results found.");
            } else {
                for (i, hit) in results.iter().enumerate() {
                    println!("{}. [{}] {}", i + 1, hit.hit_type, hit.path);
                    println!("   {}", hit.excerpt);
                }
            }
        }

        Commands::Snippet {
            path,
            file,
            start,
            end,
        } => {
            let snippet = container
                .snippet_use_case()
                .execute(std::path::Path::new(&path), &file, start, end)
                .await?;
            println!(
                "{} ({}-{} of {} lines)",
                snippet.path, snippet.start_line, snippet.end_line, snippet.total_lines
            );
            println!("{}", snippet.text);
        }

        Commands::Context {
            path,
            task,
            budget,
            hint_paths,
            hint_symbols,
        } => {
            let hints = RetrievalHints {
                paths: (!hint_paths.is_empty()).then_some(hint_paths),
                symbols: (!hint_symbols.is_empty()).then_some(hint_symbols),
                lang: None,
            };
            let bundle = container
                .context_use_case()
                .execute(std::path::Path::new(&path), &task, budget, &hints)
                .await?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }

        Commands::Mcp => {
            cindex::connector::mcp::run_stdio(Arc::new(container)).await?;
        }
    }

    Ok(())
}

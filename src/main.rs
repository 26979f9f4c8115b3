//! # Query Desk CLI (`qdesk`)
//!
//! The `qdesk` binary is the primary interface for Query Desk. It creates
//! the knowledge store, ingests documents and datasets into it, answers
//! questions against it, and exports it.
//!
//! ## Usage
//!
//! ```bash
//! qdesk --config ./config/qdesk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qdesk init` | Create an empty store file |
//! | `qdesk extract <file>` | Print the record extracted from one document |
//! | `qdesk ingest <path>...` | Add documents and dataset rows to the store |
//! | `qdesk ask "<query>"` | Answer one question |
//! | `qdesk chat` | Interactive session on stdin/stdout |
//! | `qdesk show` | Print the store's columns and records |
//! | `qdesk export` | Write the store as JSON or CSV |
//!
//! ## Examples
//!
//! ```bash
//! # Load a Q&A sheet and ask it something
//! qdesk ingest ./faq.csv
//! qdesk ask "what should I do about a fever"
//!
//! # Pull contact details out of a CV without touching the store
//! qdesk extract ./cv.pdf
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use query_desk::{chat, config, export, extract, ingest, persist};

/// Query Desk CLI: answer free-text questions from uploaded documents and
/// datasets.
///
/// All commands except `extract` read a TOML configuration file given by
/// `--config`. See `config/qdesk.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "qdesk",
    about = "Query Desk: answer free-text questions with the closest matching record",
    version,
    long_about = "Query Desk extracts structured records from PDF, DOCX and text documents, \
    loads rows from CSV and JSON datasets, and answers questions by fuzzy-matching them \
    against the stored records."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/qdesk.toml`.
    #[arg(long, global = true, default_value = "./config/qdesk.toml")]
    config: PathBuf,

    /// Log debug output to stderr. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the store file.
    ///
    /// Idempotent: an existing store is left untouched.
    Init,

    /// Extract name, contact, keywords and summary from one document.
    ///
    /// Prints the record as JSON. Does not read the config or the store.
    Extract {
        /// PDF, DOCX, TXT or MD file.
        file: PathBuf,
    },

    /// Ingest files or directories into the store.
    ///
    /// Documents become one extracted record each; CSV and JSON datasets
    /// add one record per row. Directories are walked with the configured
    /// include/exclude globs.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Show what would be ingested without writing the store.
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer one question and exit.
    Ask {
        /// The question, as typed.
        query: String,
    },

    /// Interactive question/answer session.
    ///
    /// Reads one query per line. `/ingest <path>` adds a file mid-session;
    /// `/quit` ends it.
    Chat {
        /// Write the session's turns to this file as JSON on exit.
        #[arg(long)]
        transcript: Option<PathBuf>,
    },

    /// Print the store's columns and records.
    Show {
        /// Maximum number of records to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export the whole store.
    Export {
        /// Output format: `json` or `csv`.
        #[arg(long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "query_desk=debug,query_desk_core=debug"
    } else {
        "query_desk=info,query_desk_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Commands that don't require config
    if let Commands::Extract { file } = &cli.command {
        extract::run_extract(file)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            persist::run_init(&cfg)?;
        }
        Commands::Ingest { paths, dry_run } => {
            ingest::run_ingest(&cfg, &paths, dry_run)?;
        }
        Commands::Ask { query } => {
            chat::run_ask(&cfg, &query)?;
        }
        Commands::Chat { transcript } => {
            chat::run_chat(&cfg, transcript.as_deref())?;
        }
        Commands::Show { limit } => {
            export::run_show(&cfg, limit)?;
        }
        Commands::Export { format, output } => {
            export::run_export(&cfg, &format, output.as_deref())?;
        }
        Commands::Extract { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

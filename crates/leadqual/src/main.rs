//! # Leadqual CLI (`lq`)
//!
//! Manage a chatbot's knowledge sources, test retrieval, score transcripts,
//! and run the HTTP API.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lq init` | Create the SQLite database and run schema migrations |
//! | `lq source add <chatbot> <file>` | Chunk, embed, and store a text file |
//! | `lq source list <chatbot>` | List a chatbot's sources |
//! | `lq source remove <chatbot> <id>` | Remove one source |
//! | `lq source clear <chatbot>` | Remove all of a chatbot's sources |
//! | `lq retrieve <chatbot> "<query>"` | Run the retrieval pipeline |
//! | `lq bant <transcript.json>` | Score a conversation transcript |
//! | `lq serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! lq init --config ./config/lq.toml
//! lq source add acme-bot ./docs/pricing.md --title "Pricing"
//! lq retrieve acme-bot "how much does the pro plan cost?" --context
//! lq bant ./transcripts/visitor-42.json
//! RUST_LOG=debug lq serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use leadqual::{bant, config, logging, migrate, retrieve, server, sources};

/// Knowledge-base retrieval and BANT lead qualification for chat widgets.
///
/// Commands that touch storage read a TOML configuration file. See
/// `config/lq.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "lq", version, about = "Leadqual: retrieval and lead qualification for chat widgets")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it again is safe.
    Init,

    /// Manage a chatbot's knowledge sources.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Retrieve the sources relevant to a query.
    ///
    /// Prints the tier that answered (similarity or fallback), the ranked
    /// sources, and any failures the pipeline absorbed.
    Retrieve {
        /// Chatbot id.
        chatbot: String,

        /// The visitor message to retrieve for.
        query: String,

        /// Maximum number of sources (defaults to `retrieval.limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum similarity (defaults to `retrieval.threshold`).
        #[arg(long)]
        threshold: Option<f64>,

        /// Print the rendered prompt context instead of the ranked list.
        #[arg(long)]
        context: bool,
    },

    /// Score a saved transcript for BANT progress.
    ///
    /// Does not read the configuration file.
    Bant {
        /// JSON transcript: an array of `{role, content}` messages.
        path: PathBuf,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum SourceAction {
    /// Chunk, embed, and store a UTF-8 text file.
    Add {
        chatbot: String,
        path: PathBuf,

        /// Source title (defaults to the file name).
        #[arg(long)]
        title: Option<String>,
    },
    /// List stored sources.
    List {
        chatbot: String,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Remove one source by id.
    Remove { chatbot: String, id: String },
    /// Remove every source of a chatbot.
    Clear { chatbot: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve => "info",
        _ => "warn",
    };
    logging::init(default_level);

    // Commands that don't require config
    if let Commands::Bant { path, json } = &cli.command {
        return bant::run_bant(path, *json);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Source { action } => match action {
            SourceAction::Add {
                chatbot,
                path,
                title,
            } => {
                sources::run_add(&cfg, &chatbot, &path, title.as_deref()).await?;
            }
            SourceAction::List { chatbot, limit } => {
                sources::run_list(&cfg, &chatbot, limit).await?;
            }
            SourceAction::Remove { chatbot, id } => {
                sources::run_remove(&cfg, &chatbot, &id).await?;
            }
            SourceAction::Clear { chatbot } => {
                sources::run_clear(&cfg, &chatbot).await?;
            }
        },
        Commands::Retrieve {
            chatbot,
            query,
            limit,
            threshold,
            context,
        } => {
            retrieve::run_retrieve(&cfg, &chatbot, &query, limit, threshold, context).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Bant { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

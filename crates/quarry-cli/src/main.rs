//! Quarry CLI - query the portal's command, knowledge base and content catalogs.
//!
//! # Usage
//!
//! ```bash
//! # Search the built-in command palette
//! qr search "trr validation"
//!
//! # Search the knowledge base with filters
//! qr --catalog knowledge search "cloud detection" --tag aws --from 2024-01-01 -n 5
//!
//! # Resolve a command name or alias
//! qr resolve "?"
//!
//! # Related content items
//! qr --catalog content recommend cnt_cloud_cred_abuse
//!
//! # Check a snapshot for duplicate names and missing categories
//! qr --catalog knowledge --snapshot kb.json validate
//!
//! # Export the loaded catalog as a JSON snapshot
//! qr --catalog content export -o content.json
//! ```

mod catalog;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use quarry_core::catalog::{CatalogKind, Commands, ContentLibrary, KnowledgeBase};
use quarry_core::search::{RecordId, SearchFilters};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quarry retrieval CLI.
///
/// Loads one catalog (the built-in corpus, or a JSON snapshot) into an
/// in-memory engine and runs a single operation against it.
#[derive(Parser)]
#[command(name = "qr", version, about)]
struct Cli {
    /// Catalog to load
    #[arg(long, value_enum, default_value_t = CatalogArg::Commands)]
    catalog: CatalogArg,

    /// Load records from a JSON snapshot instead of the built-in corpus
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogArg {
    Commands,
    Knowledge,
    Content,
}

#[derive(Subcommand)]
enum Command {
    /// Ranked full-text search
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (default: configured result limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Only records in this category
        #[arg(long)]
        category: Option<String>,

        /// Only records carrying this tag (repeatable; all must match)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Only records by this author
        #[arg(long)]
        author: Option<String>,

        /// Published on or after (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Published on or before (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve an exact name or alias
    Resolve {
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Records related to the given id
    Recommend {
        id: String,

        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Report duplicate names and unclassified records
    Validate {
        #[arg(long)]
        json: bool,
    },

    /// Write the catalog as a JSON snapshot
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let success = match cli.catalog {
        CatalogArg::Commands => run::<Commands>(&cli)?,
        CatalogArg::Knowledge => run::<KnowledgeBase>(&cli)?,
        CatalogArg::Content => run::<ContentLibrary>(&cli)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Runs the selected command against catalog `K`.
///
/// Returns `false` when the command completed but found a problem
/// (no match for `resolve`, an invalid catalog for `validate`).
fn run<K: CatalogKind>(cli: &Cli) -> Result<bool> {
    let engine_config = config::load_engine_config(cli.config.as_ref())?;
    let catalog = catalog::open::<K>(engine_config, cli.snapshot.as_ref())?;

    match &cli.command {
        Command::Search {
            query,
            limit,
            category,
            tags,
            author,
            from,
            to,
            json,
        } => {
            let filters = SearchFilters {
                category: category.clone(),
                tags: tags.clone(),
                author: author.clone(),
                published_from: from.clone(),
                published_to: to.clone(),
            };
            let hits = match limit {
                Some(limit) => catalog.search_with_limit(query, &filters, *limit),
                None => catalog.search(query, &filters),
            };

            let output = if *json {
                output::format_search_json(query, &hits)
            } else {
                output::format_search_human(query, &hits)
            };
            println!("{}", output);
            Ok(true)
        }
        Command::Resolve { name, json } => {
            let record = catalog.resolve_exact(name);
            let output = if *json {
                output::format_resolve_json(name, record.as_ref())
            } else {
                output::format_resolve_human(name, record.as_ref())
            };
            println!("{}", output);
            Ok(record.is_some())
        }
        Command::Recommend { id, limit, json } => {
            let id = RecordId::from(id.as_str());
            if catalog.engine().get(&id).is_none() {
                eprintln!("No record with id \"{}\" in the {} catalog.", id, K::NAME);
                return Ok(false);
            }

            let recommendations = catalog.recommend(&id, *limit);
            let output = if *json {
                output::format_recommendations_json(&id, &recommendations)
            } else {
                output::format_recommendations_human(&id, &recommendations)
            };
            println!("{}", output);
            Ok(true)
        }
        Command::Validate { json } => {
            let report = catalog.validate();
            let output = if *json {
                output::format_report_json(K::NAME, &report)
            } else {
                output::format_report_human(K::NAME, &report)
            };
            println!("{}", output);
            Ok(report.is_valid)
        }
        Command::Export { output } => {
            catalog::export(&catalog, output.as_ref())?;
            Ok(true)
        }
    }
}

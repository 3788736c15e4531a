//! Tabula CLI
//!
//! Command-line queries over JSON record sets.
//!
//! # Commands
//!
//! - `get` - Print records by key, position or range
//! - `select` - Print records matching a JSON where clause
//! - `sort` - Print records ordered by a sort specification
//! - `unique` - Print the distinct values of a field
//! - `inspect` - Display record counts, indexes and consistency
//! - `save` / `restore` - Snapshot a record set to a directory and back

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tabula command-line record tools.
#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file holding a list of objects or an object of objects
    #[arg(global = true, short, long)]
    file: Option<PathBuf>,

    /// Primary-key field
    #[arg(global = true, short, long)]
    key: Option<String>,

    /// Secondary index to declare (comma-separated fields, repeatable)
    #[arg(global = true, short, long)]
    index: Vec<String>,

    /// Dot-separated path to the records inside the file
    #[arg(global = true, long)]
    source: Option<String>,

    /// Output format (text, json)
    #[arg(global = true, long, default_value = "text")]
    format: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print records by key, position or range
    Get {
        /// Comma-separated keys or positions, or "all"
        #[arg(default_value = "all")]
        selector: String,

        /// Print `count` records starting at this position instead
        #[arg(long)]
        start: Option<usize>,

        /// Number of records for --start
        #[arg(long, default_value = "10")]
        count: usize,
    },

    /// Print records matching a where clause
    Select {
        /// JSON object of field equalities, e.g. '{"age": 25}'
        #[arg(short = 'w', long = "where")]
        query: String,
    },

    /// Print records in sorted order
    Sort {
        /// Sort specification, e.g. "age, id desc"
        order: String,

        /// Optional JSON where clause applied first
        #[arg(short = 'w', long = "where")]
        query: Option<String>,
    },

    /// Print the distinct values of a field
    Unique {
        /// Field name
        field: String,
    },

    /// Display record counts, indexes and consistency
    Inspect,

    /// Save the record set as a snapshot in a directory
    Save {
        /// Snapshot directory
        dir: PathBuf,

        /// Snapshot name
        #[arg(short, long, default_value = "records")]
        name: String,
    },

    /// Print the records of a saved snapshot
    Restore {
        /// Snapshot directory
        dir: PathBuf,

        /// Snapshot name
        #[arg(short, long, default_value = "records")]
        name: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = commands::LoadOptions {
        file: cli.file,
        key: cli.key,
        indexes: cli.index,
        source: cli.source,
    };
    let format = commands::Format::parse(&cli.format)?;

    match cli.command {
        Commands::Get {
            selector,
            start,
            count,
        } => {
            let store = options.open("records").await?;
            commands::query::get(&store, &selector, start.map(|start| (start, count)), format)?;
        }
        Commands::Select { query } => {
            let store = options.open("records").await?;
            commands::query::select(&store, &query, format).await?;
        }
        Commands::Sort { order, query } => {
            let store = options.open("records").await?;
            commands::query::sort(&store, &order, query.as_deref(), format).await?;
        }
        Commands::Unique { field } => {
            let store = options.open("records").await?;
            commands::query::unique(&store, &field, format)?;
        }
        Commands::Inspect => {
            let store = options.open("records").await?;
            commands::inspect::run(&store, format)?;
        }
        Commands::Save { dir, name } => {
            let store = options.open(&name).await?;
            commands::snapshot::save(&store, &dir)?;
        }
        Commands::Restore { dir, name } => {
            commands::snapshot::restore(&options, &dir, &name, format)?;
        }
        Commands::Version => {
            println!("Tabula CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

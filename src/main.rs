//! # iSamples CLI (`isb`)
//!
//! Query the iSamples central index from the command line.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `isb fields` | List the Solr schema field names |
//! | `isb count <q>` | Number of records matching a query |
//! | `isb facets <q> --field F` | Flat facet counts |
//! | `isb pivot <q> --dim A --dim B` | Pivot table across two or more fields |
//! | `isb materialize <file> --dim A --dim B` | Pivot table from a saved response |
//! | `isb config` | Print the effective configuration |
//!
//! ## Examples
//!
//! ```bash
//! isb count 'source:SESAR'
//! isb facets '*:*' --field source --field hasMaterialCategory
//! isb pivot '*:*' --dim source --dim hasMaterialCategory
//! isb materialize ./response.json --dim source --dim hasMaterialCategory --json
//! ```
//!
//! Log verbosity follows `ISB_LOG` (an `EnvFilter` directive), then
//! `--verbose` / `--quiet`. Logs go to stderr.

use clap::{Parser, Subcommand};
use isamples_client::{config, facets, pivot, records};
use std::path::PathBuf;

/// iSamples CLI: record counts, facets and pivot tables from the iSamples
/// central index.
#[derive(Parser)]
#[command(name = "isb", version, about = "Query the iSamples central index")]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/isb.toml` when present, otherwise built-in
    /// defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `server.url` from the configuration.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log requests and transport decisions.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List field names from the Solr schema.
    Fields,

    /// Print the number of records matching a query.
    Count {
        /// Solr query, e.g. `source:SESAR` or `*:*`.
        q: String,
    },

    /// Flat facet counts for one or more fields.
    Facets {
        /// Solr query.
        q: String,

        /// Field to facet on. Repeatable.
        #[arg(long = "field", required = true)]
        fields: Vec<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Pivot table of counts across two or more fields.
    ///
    /// Facet values are trimmed and lower-cased, so values differing only
    /// in case or surrounding whitespace share a row/column.
    Pivot {
        /// Solr query.
        q: String,

        /// Pivot dimension, outermost first. Repeat at least twice.
        #[arg(long = "dim")]
        dims: Vec<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Build a pivot table from a saved select response (no network).
    ///
    /// The file may contain the full response JSON or just the
    /// `facet_pivot` node array.
    Materialize {
        /// Path to the JSON file.
        path: PathBuf,

        /// Pivot dimension, outermost first. Repeat at least twice.
        #[arg(long = "dim")]
        dims: Vec<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML.
    Config,
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ISB_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    // Offline command: no configuration needed
    if let Commands::Materialize { path, dims, json } = &cli.command {
        pivot::run_materialize(path, dims, *json)?;
        return Ok(());
    }

    let mut cfg = config::resolve_config(cli.config.as_deref())?;
    if let Some(url) = cli.server {
        cfg.server.url = url;
        cfg.validate()?;
    }

    match cli.command {
        Commands::Fields => records::run_fields(&cfg).await?,
        Commands::Count { q } => records::run_count(&cfg, &q).await?,
        Commands::Facets { q, fields, json } => facets::run_facets(&cfg, &q, &fields, json).await?,
        Commands::Pivot { q, dims, json } => pivot::run_pivot(&cfg, &q, &dims, json).await?,
        Commands::Config => print!("{}", toml::to_string_pretty(&cfg)?),
        Commands::Materialize { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

//! sqlitefmt-inspect: print the header and b-tree pages of a database file.
//!
//! # Usage
//!
//! ```bash
//! # Header plus every page
//! sqlitefmt-inspect test.db
//!
//! # Only pages 1 and 5, with reassembled cell payloads
//! sqlitefmt-inspect -p 1 -p 5 --payloads test.db
//!
//! # Machine-readable output
//! sqlitefmt-inspect -o json test.db
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sqlitefmt::{PageNum, PageStore, StoreConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod report;

use report::{InspectOptions, Report};

/// Inspect a SQLite 3 database file without modifying it
#[derive(Parser, Debug)]
#[command(name = "sqlitefmt-inspect", version, about)]
struct Args {
    /// Database file to inspect
    #[arg(value_name = "DBFILE")]
    path: PathBuf,

    /// Decode only this page (repeatable); defaults to every page
    #[arg(short = 'p', long = "page", value_name = "N")]
    pages: Vec<PageNum>,

    /// Reassemble each table-leaf cell's payload, following overflow chains
    #[arg(long)]
    payloads: bool,

    /// Hex dump the cell content area of each table-leaf page
    #[arg(long)]
    hexdump: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Fail when the header claims more pages than the file holds
    #[arg(long, env = "SQLITEFMT_STRICT")]
    strict: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = StoreConfig {
        strict_page_count: args.strict,
    };
    let mut store = PageStore::open_with_config(&args.path, config)
        .with_context(|| format!("failed to open {}", args.path.display()))?;
    info!(path = %args.path.display(), "inspecting database");

    let pages = if args.pages.is_empty() {
        (1..=store.page_count()).collect()
    } else {
        args.pages.clone()
    };
    debug!(count = pages.len(), "pages selected");

    let options = InspectOptions {
        payloads: args.payloads,
        hexdump: args.hexdump,
    };
    let report = Report::build(&mut store, &pages, options)?;
    store.close();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => report.write_text(&mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report).context("failed to write JSON")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sqlitefmt=debug,sqlitefmt_inspect=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

use anyhow::Result;
use catalog_core::catalog_file::load_records;
use catalog_core::fallback::scan_records;
use catalog_core::{build, query, suggest, IndexSnapshot, SourceType};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Inspect a catalog: build an in-memory index and query it", long_about = None)]
struct Cli {
    /// Catalog file or directory of .json/.jsonl files
    #[arg(long, global = true, default_value = "./catalog/primary")]
    input: PathBuf,
    /// Source type assigned to every loaded record
    #[arg(long, global = true, value_enum, default_value_t = Source::Primary)]
    source: Source,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Primary,
    Licensed,
    Ebook,
}

impl From<Source> for SourceType {
    fn from(s: Source) -> Self {
        match s {
            Source::Primary => SourceType::Primary,
            Source::Licensed => SourceType::Licensed,
            Source::Ebook => SourceType::Ebook,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked index query
    Query {
        text: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Title completions for a prefix
    Suggest {
        text: String,
        #[arg(long, default_value_t = 8)]
        limit: usize,
    },
    /// Unranked substring scan, as served in degraded mode
    Scan {
        text: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Index statistics
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let records = load_records(&cli.input, cli.source.into())?;
    tracing::info!(records = records.len(), input = %cli.input.display(), "catalog loaded");

    match cli.command {
        Commands::Query { text, limit } => {
            let snapshot = timed_build(records);
            for hit in query(&snapshot, &text, limit) {
                let title = snapshot.record(&hit.record_id).map(|r| r.title.as_str()).unwrap_or_default();
                println!("{}", json!({ "record_id": hit.record_id, "score": hit.score, "title": title }));
            }
        }
        Commands::Suggest { text, limit } => {
            let snapshot = timed_build(records);
            for title in suggest(&snapshot, &text, limit) {
                println!("{}", json!({ "suggestion": title }));
            }
        }
        Commands::Scan { text, limit } => {
            for record in scan_records(&records, &text, limit) {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        Commands::Stats => {
            let snapshot = timed_build(records);
            println!("{}", serde_json::to_string_pretty(&snapshot.stats())?);
        }
    }
    Ok(())
}

fn timed_build(records: Vec<catalog_core::Record>) -> IndexSnapshot {
    let start = Instant::now();
    let snapshot = build(records);
    tracing::info!(terms = snapshot.term_count(), elapsed_ms = start.elapsed().as_millis() as u64, "index built");
    snapshot
}

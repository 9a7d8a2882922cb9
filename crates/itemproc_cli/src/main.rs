//! Command-line entry point for batch item processing.
//!
//! # Responsibility
//! - Open (or create) an item database and optionally seed demo items.
//! - Run one `process_all` batch and print the processed items as JSON.

use clap::Parser;
use itemproc_core::db::{open_db, open_db_in_memory};
use itemproc_core::{
    init_logging, CancellationToken, Item, ItemService, ProcessingConfig, SqliteItemRepository,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// Marks every stored item PROCESSED on a bounded worker pool.
#[derive(Parser, Debug)]
#[command(name = "itemproc", version)]
struct Args {
    /// SQLite database file; an in-memory database is used when omitted
    #[arg(long)]
    db: Option<PathBuf>,

    /// Insert this many demo items before processing
    #[arg(long, default_value_t = 0)]
    seed: usize,

    /// Maximum workers in flight
    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    /// Simulated per-item latency in milliseconds
    #[arg(long, default_value_t = 100)]
    latency_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = itemproc_core::default_log_level().to_string())]
    log_level: String,

    /// Absolute directory for rotating log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_deref() {
        init_logging(&args.log_level, log_dir)?;
    }

    let config = ProcessingConfig::new(args.concurrency, Duration::from_millis(args.latency_ms))?;
    let conn = match args.db.as_ref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = ItemService::with_config(SqliteItemRepository::new(conn), config);

    for index in 0..args.seed {
        let item = Item::new(format!("Demo item {index}"), format!("demo{index}@example.com"))
            .with_description("seeded from the command line");
        service.create(&item)?;
    }
    if args.seed > 0 {
        info!("event=seed module=cli status=ok count={}", args.seed);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let report = service.process_all_with_report(&cancel).await?;
    eprintln!(
        "processed {}/{} items (not_found={} conflicts={} cancelled={} failed={})",
        report.stats.processed,
        report.stats.requested,
        report.stats.not_found,
        report.stats.conflicts,
        report.stats.cancelled,
        report.stats.failed
    );
    println!("{}", serde_json::to_string_pretty(&report.items)?);

    Ok(())
}

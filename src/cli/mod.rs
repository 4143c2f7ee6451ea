//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::naming;
use crate::scrapers::{clean_base_url, ChromeDriver, CrawlSession};
use crate::services::crawl::{self, CrawlOrchestrator};
use crate::services::reconcile;

#[derive(Parser)]
#[command(name = "albumgrab")]
#[command(about = "Product catalog acquisition tool for JS-rendered album storefronts")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a catalog listing and archive every product image
    Crawl {
        /// Listing URL (category page or full album list)
        url: String,
        /// Run folder name (default: scrape_catalog_<timestamp>)
        #[arg(short, long)]
        folder: Option<String>,
        /// Run the browser with a visible window
        #[arg(long)]
        headed: bool,
    },

    /// Compare an export's declared successes against the files on disk
    Reconcile {
        /// Run folder containing the CSV export and images/
        folder: PathBuf,
        /// Export base name
        #[arg(long, default_value = "catalog_data")]
        base_name: String,
    },

    /// Normalize a raw product title and print the result
    CleanName {
        /// Title as it appears on the product page
        title: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl {
            url,
            folder,
            headed,
        } => cmd_crawl(&settings, &url, folder.as_deref(), headed).await,
        Commands::Reconcile { folder, base_name } => cmd_reconcile(&folder, &base_name),
        Commands::CleanName { title } => {
            println!("{}", naming::normalize(&title));
            Ok(())
        }
    }
}

async fn cmd_crawl(
    settings: &Settings,
    url: &str,
    folder: Option<&str>,
    headed: bool,
) -> anyhow::Result<()> {
    let base_url = clean_base_url(url);
    if base_url != url {
        info!("Cleaned listing URL: {}", base_url);
    }

    let run = crawl::prepare_run_folder(folder)?;
    info!("Run folder: {}", run.root.display());

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_interrupt_watcher(cancel.clone());

    let mut session = CrawlSession::new(
        &settings.source_host,
        Duration::from_secs(settings.timing.request_timeout_secs),
    )?;

    let mut driver = ChromeDriver::launch(!headed).await?;

    let orchestrator = CrawlOrchestrator::new(settings.clone());
    let outcome = orchestrator
        .run(&mut driver, &mut session, &base_url, &run, cancel)
        .await;

    driver.close().await;

    if outcome.interrupted {
        warn!("Run was interrupted; exporting partial results");
    }
    crawl::finish_run(&outcome, &run, &settings.output.base_name)?;

    Ok(())
}

fn cmd_reconcile(folder: &PathBuf, base_name: &str) -> anyhow::Result<()> {
    let csv_path = folder.join(format!("{}.csv", base_name));
    let records = read_export(&csv_path)?;
    info!("Loaded {} rows from {}", records.len(), csv_path.display());

    let report = reconcile::reconcile(&records, &folder.join("images"))?;
    reconcile::log_report(&report, records.len());

    if report.has_drift() {
        error!("Declared and on-disk image counts disagree");
    }
    Ok(())
}

/// Read a previous run's CSV back into records for reconciliation.
fn read_export(path: &std::path::Path) -> anyhow::Result<Vec<crate::models::ProductRecord>> {
    use crate::models::{DownloadStatus, ProductRecord};
    use chrono::Utc;

    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or("").to_string();
        let optional = |i: usize, missing: &str| {
            let v = field(i);
            (v != missing && !v.is_empty()).then_some(v)
        };
        let status = field(6);
        let download_status = if status == "SUCCESS" {
            DownloadStatus::Success
        } else {
            DownloadStatus::Failed(
                status.strip_prefix("FAILED: ").unwrap_or(&status).to_string(),
            )
        };
        records.push(ProductRecord {
            canonical_name: field(0),
            raw_name: field(1),
            source_link: field(2),
            original_image_url: optional(3, "not found"),
            served_image_url: optional(4, "unavailable"),
            saved_filename: optional(5, "not downloaded"),
            download_status,
            page_number: field(7).parse().unwrap_or(0),
            scraped_at: chrono::NaiveDateTime::parse_from_str(&field(8), "%Y-%m-%d %H:%M:%S")
                .map(|n| n.and_utc())
                .unwrap_or_else(|_| Utc::now()),
        });
    }
    Ok(records)
}

/// Flip the cancel flag on the first Ctrl-C so the page loop can drain.
fn spawn_interrupt_watcher(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current item before exporting");
            cancel.store(true, Ordering::Relaxed);
        }
    });
}

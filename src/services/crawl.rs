//! Crawl orchestration.
//!
//! Drives the browser across listing pages and product pages, owns the global
//! image counter, and assembles the result set. Execution is strictly
//! sequential: one listing page at a time, one product at a time through a
//! secondary navigation context that is closed on every exit path.
//!
//! Failure isolation: a product that cannot be extracted or downloaded is
//! recorded (or skipped) and the page continues; a page that cannot be
//! navigated is logged and the crawl moves to the next page; an operator
//! interrupt ends the page loop but still reaches the export path.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::ScrapeError;
use crate::export;
use crate::models::{ImageCounter, PaginationState, ProductRecord};
use crate::naming;
use crate::scrapers::extract::first_match;
use crate::scrapers::{build_page_url, CrawlSession, PageDriver, PaginationDetector};
use crate::services::image::ImageFetcher;

/// Where a run writes its artifacts.
#[derive(Debug, Clone)]
pub struct RunFolder {
    pub root: PathBuf,
    pub images_dir: PathBuf,
}

impl RunFolder {
    /// Create the folder and its `images/` subdirectory.
    pub fn create(root: PathBuf) -> std::io::Result<Self> {
        let images_dir = root.join("images");
        std::fs::create_dir_all(&images_dir)?;
        Ok(Self { root, images_dir })
    }

    /// Basename used in served-image URLs.
    pub fn basename(&self) -> &str {
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(".")
    }
}

/// Result of a crawl run.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub records: Vec<ProductRecord>,
    pub pagination: PaginationState,
    /// Products attempted (equals the counter's final position).
    pub attempts: u64,
    /// True when the operator interrupted the run.
    pub interrupted: bool,
}

/// Sequential crawl driver.
pub struct CrawlOrchestrator {
    settings: Settings,
    fetcher: ImageFetcher,
}

impl CrawlOrchestrator {
    pub fn new(settings: Settings) -> Self {
        let fetcher = ImageFetcher::new(
            &settings.source_host,
            &settings.output.served_base_url,
            settings.output.jpeg_quality,
            Duration::from_millis(settings.timing.min_image_delay_ms),
            Duration::from_millis(settings.timing.max_image_delay_ms),
        );
        Self { settings, fetcher }
    }

    /// Crawl the whole listing starting from `base_url`.
    ///
    /// `cancel` is checked between pages and between products; when set, the
    /// loop exits and whatever was gathered is returned for the final flush.
    pub async fn run(
        &self,
        driver: &mut dyn PageDriver,
        session: &mut CrawlSession,
        base_url: &str,
        run: &RunFolder,
        cancel: Arc<AtomicBool>,
    ) -> CrawlOutcome {
        let mut records = Vec::new();
        let mut counter = ImageCounter::new();

        info!("Checking pagination on {}", base_url);
        let pagination = match driver.navigate(base_url).await {
            Ok(()) => {
                self.settle(self.settings.timing.page_settle_ms).await;
                PaginationDetector::new(&self.settings.selectors)
                    .detect(driver)
                    .await
            }
            Err(e) => {
                // Without the first page there is nothing to crawl; flush
                // whatever exists (nothing) through the normal path.
                error!("Could not open the listing: {}", e);
                return CrawlOutcome {
                    records,
                    pagination: PaginationState::single_page(),
                    attempts: counter.attempts(),
                    interrupted: false,
                };
            }
        };

        let mut interrupted = false;

        for page_num in 1..=pagination.total_pages {
            if cancel.load(Ordering::Relaxed) {
                info!("Crawl interrupted by operator");
                interrupted = true;
                break;
            }

            match self
                .scrape_page(driver, session, base_url, page_num, &pagination, run, &mut counter, &cancel, &mut records)
                .await
            {
                Ok(scraped) => {
                    info!("Page {} done: {} products scraped", page_num, scraped)
                }
                Err(e) => {
                    warn!("Page {} failed, moving on: {}", page_num, e);
                }
            }

            if cancel.load(Ordering::Relaxed) {
                info!("Crawl interrupted by operator");
                interrupted = true;
                break;
            }

            let every = self.settings.output.snapshot_every_pages.max(1);
            let snapshot_due = (pagination.has_pagination && page_num % every == 0)
                || (!pagination.has_pagination && page_num == 1);
            if snapshot_due && !records.is_empty() {
                if let Err(e) =
                    export::write_snapshot(&records, &run.root, &self.settings.output.base_name)
                {
                    warn!("Snapshot save failed: {}", e);
                }
            }

            if page_num < pagination.total_pages {
                self.settle(self.settings.timing.page_pause_ms).await;
            }
        }

        CrawlOutcome {
            records,
            pagination,
            attempts: counter.attempts(),
            interrupted,
        }
    }

    /// Scrape every product on one listing page.
    ///
    /// Errors out only on page-level faults (navigation, wait timeout);
    /// per-product problems are handled locally.
    #[allow(clippy::too_many_arguments)]
    async fn scrape_page(
        &self,
        driver: &mut dyn PageDriver,
        session: &mut CrawlSession,
        base_url: &str,
        page_num: u32,
        pagination: &PaginationState,
        run: &RunFolder,
        counter: &mut ImageCounter,
        cancel: &AtomicBool,
        records: &mut Vec<ProductRecord>,
    ) -> Result<usize, ScrapeError> {
        let page_url = build_page_url(base_url, page_num, pagination.has_pagination);
        info!("Scraping page {}: {}", page_num, page_url);

        driver.navigate(&page_url).await?;
        driver
            .wait_for(
                &self.settings.selectors.product_links,
                Duration::from_secs(self.settings.timing.wait_timeout_secs),
            )
            .await?;
        self.settle(self.settings.timing.page_settle_ms).await;

        let links: Vec<String> = driver
            .find_all(&self.settings.selectors.product_links)
            .await
            .iter()
            .filter_map(|el| el.attr("href").map(|s| s.to_string()))
            .collect();
        info!("{} products found on page {}", links.len(), page_num);

        let mut scraped = 0;
        for (index, link) in links.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                break;
            }

            // One slot per attempt, taken before anything can fail, so
            // numbering stays aligned with the visit order.
            let slot = counter.advance();
            info!("Processing item {}/{} (slot img-{})", index + 1, links.len(), slot);

            match self
                .scrape_product(driver, session, link, slot, page_num, run)
                .await
            {
                Ok(record) => {
                    records.push(record);
                    scraped += 1;
                }
                Err(e) => {
                    warn!("Item {} skipped: {}", link, e);
                }
            }
        }

        Ok(scraped)
    }

    /// Visit one product page in the secondary context and build its record.
    ///
    /// The secondary context is closed on every exit path before the result
    /// is returned.
    async fn scrape_product(
        &self,
        driver: &mut dyn PageDriver,
        session: &mut CrawlSession,
        link: &str,
        slot: u64,
        page_num: u32,
        run: &RunFolder,
    ) -> Result<ProductRecord, ScrapeError> {
        driver.open_secondary(link).await?;
        let extracted = self.extract_product(driver).await;
        driver.close_secondary().await;

        let (raw_name, image_url) = extracted?;
        let canonical_name = naming::normalize(&raw_name);
        info!("Title: {} -> {}", truncate_for_log(&raw_name), canonical_name);

        let Some(image_url) = image_url else {
            warn!("No image URL found for {}", link);
            return Ok(ProductRecord::failed(
                canonical_name,
                raw_name,
                link.to_string(),
                None,
                "image URL not found".to_string(),
                page_num,
            ));
        };

        match self
            .fetcher
            .fetch(&image_url, slot, session, &run.images_dir, run.basename())
            .await
        {
            Ok(saved) => Ok(ProductRecord::succeeded(
                canonical_name,
                raw_name,
                link.to_string(),
                image_url,
                saved.served_url,
                saved.filename,
                page_num,
            )),
            Err(e) => {
                warn!("Download failed for slot img-{}: {}", slot, e);
                Ok(ProductRecord::failed(
                    canonical_name,
                    raw_name,
                    link.to_string(),
                    Some(image_url),
                    e.to_string(),
                    page_num,
                ))
            }
        }
    }

    /// Pull title and image URL out of the open secondary context.
    async fn extract_product(
        &self,
        driver: &mut dyn PageDriver,
    ) -> Result<(String, Option<String>), ScrapeError> {
        self.settle(self.settings.timing.product_settle_ms).await;

        let title = first_match(driver, &self.settings.selectors.title)
            .await
            .ok_or_else(|| {
                ScrapeError::ExtractionFailed("no title selector matched".to_string())
            })?;
        let image_url = first_match(driver, &self.settings.selectors.image).await;

        Ok((title, image_url))
    }

    async fn settle(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

/// Flush records, clean up snapshots, and report reconciliation.
///
/// Runs on every exit path, including interruption.
pub fn finish_run(
    outcome: &CrawlOutcome,
    run: &RunFolder,
    base_name: &str,
) -> anyhow::Result<()> {
    if outcome.records.is_empty() {
        warn!("No data was scraped");
        return Ok(());
    }

    export::export_final(&outcome.records, &run.root, base_name)?;
    export::remove_snapshots(&run.root, base_name);

    summarize(outcome);

    let report = crate::services::reconcile::reconcile(&outcome.records, &run.images_dir)?;
    crate::services::reconcile::log_report(&report, outcome.records.len());

    Ok(())
}

fn summarize(outcome: &CrawlOutcome) {
    let successes = outcome
        .records
        .iter()
        .filter(|r| r.download_status.is_success())
        .count();

    info!("Total products scraped: {}", outcome.records.len());
    info!("Products attempted: {}", outcome.attempts);
    if !outcome.records.is_empty() {
        info!(
            "Declared successful downloads: {}/{} ({:.1}%)",
            successes,
            outcome.records.len(),
            successes as f64 * 100.0 / outcome.records.len() as f64
        );
    }

    let mut pages: Vec<u32> = outcome.records.iter().map(|r| r.page_number).collect();
    pages.sort_unstable();
    pages.dedup();
    for page in pages {
        let count = outcome
            .records
            .iter()
            .filter(|r| r.page_number == page)
            .count();
        info!("Page {}: {} products", page, count);
    }
}

fn truncate_for_log(s: &str) -> String {
    if s.chars().count() <= 60 {
        s.to_string()
    } else {
        let head: String = s.chars().take(60).collect();
        format!("{}...", head)
    }
}

/// Default run-folder name for a new crawl.
pub fn default_run_folder_name() -> String {
    format!(
        "scrape_catalog_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Resolve the operator's folder choice into a created `RunFolder`.
pub fn prepare_run_folder(name: Option<&str>) -> std::io::Result<RunFolder> {
    let name = match name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => default_run_folder_name(),
    };
    RunFolder::create(Path::new(&name).to_path_buf())
}

//! Image acquisition pipeline.
//!
//! One image per product: fetched through the anti-bot session, screened for
//! placeholder stubs, re-encoded to the canonical format, and written under a
//! caller-supplied filename slot. Every step is a possible early exit with a
//! specific failure; the write is verified by reading the file back.

pub mod canonical;
pub mod validate;

pub use canonical::{to_canonical, CANONICAL_EXT, DEFAULT_QUALITY};
pub use validate::{is_placeholder, MIN_IMAGE_BYTES, PLACEHOLDER_INDICATORS};

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};
use url::Url;

use crate::error::ScrapeError;
use crate::scrapers::CrawlSession;

/// A successfully archived image.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub filename: String,
    pub served_url: String,
}

/// Fetches, validates, canonicalizes, and stores product images.
pub struct ImageFetcher {
    source_host: String,
    served_base_url: String,
    quality: u8,
    min_delay: Duration,
    max_delay: Duration,
}

impl ImageFetcher {
    pub fn new(
        source_host: &str,
        served_base_url: &str,
        quality: u8,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            source_host: source_host.to_string(),
            served_base_url: served_base_url.trim_end_matches('/').to_string(),
            quality,
            min_delay,
            max_delay,
        }
    }

    /// Download one image into slot `counter` under `images_dir`.
    ///
    /// The counter value is supplied by the caller and never advanced here;
    /// the orchestrator is the single source of truth for numbering.
    pub async fn fetch(
        &self,
        url: &str,
        counter: u64,
        session: &mut CrawlSession,
        images_dir: &Path,
        run_folder: &str,
    ) -> Result<FetchedImage, ScrapeError> {
        let url = url.trim();
        let parsed = Url::parse(url).map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScrapeError::InvalidUrl(url.to_string()));
        }

        // Randomized politeness delay; keeps the request cadence irregular.
        self.jittered_pause().await;

        if !self.source_host.is_empty() {
            session.refresh_referer_for(&parsed);
        }

        debug!("Downloading {}", url);
        let response = session.get(url).await.map_err(ScrapeError::from)?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(ScrapeError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await.map_err(ScrapeError::from)?;

        if is_placeholder(body.len(), &final_url, content_type.as_deref()) {
            return Err(ScrapeError::PlaceholderDetected);
        }

        let canonical = to_canonical(&body, self.quality)?;

        let filename = format!("img-{}.{}", counter, CANONICAL_EXT);
        let file_path = images_dir.join(&filename);

        tokio::fs::write(&file_path, &canonical)
            .await
            .map_err(|e| ScrapeError::WriteVerificationFailed(e.to_string()))?;

        // Read-back check: the file must exist and be non-empty before the
        // slot counts as saved.
        match tokio::fs::metadata(&file_path).await {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => {
                let _ = tokio::fs::remove_file(&file_path).await;
                return Err(ScrapeError::WriteVerificationFailed(format!(
                    "empty file: {}",
                    file_path.display()
                )));
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&file_path).await;
                return Err(ScrapeError::WriteVerificationFailed(e.to_string()));
            }
        }

        let served_url = format!("{}/images/{}/{}", self.served_base_url, run_folder, filename);
        info!("Saved {} ({} bytes)", filename, canonical.len());

        Ok(FetchedImage {
            filename,
            served_url,
        })
    }

    async fn jittered_pause(&self) {
        if self.max_delay.is_zero() {
            return;
        }
        let lo = (self.min_delay.as_millis() as u64).min(self.max_delay.as_millis() as u64);
        let hi = self.max_delay.as_millis() as u64;
        let pause = rand::rng().random_range(lo..=hi);
        tokio::time::sleep(Duration::from_millis(pause)).await;
    }
}

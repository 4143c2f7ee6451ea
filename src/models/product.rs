//! Product records and run-scoped crawl state.
//!
//! One record is created per product visit and is immutable afterwards. The
//! image counter is the single source of truth for `img-<n>` filename slots:
//! it advances exactly once per attempted product, success or failure, so
//! slots are never reused within a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the image download for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    Success,
    Failed(String),
}

impl DownloadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Human-readable form used in the export's status column.
    pub fn label(&self) -> String {
        match self {
            Self::Success => "SUCCESS".to_string(),
            Self::Failed(reason) => format!("FAILED: {}", reason),
        }
    }
}

/// One product listing, as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Normalized 1-2 token identifier.
    pub canonical_name: String,
    /// Title as found on the product page.
    pub raw_name: String,
    /// Product page URL.
    pub source_link: String,
    /// Image URL discovered on the product page, if any.
    pub original_image_url: Option<String>,
    /// Externally servable URL for the saved image.
    pub served_image_url: Option<String>,
    /// Filename under `images/`, present only on success.
    pub saved_filename: Option<String>,
    pub download_status: DownloadStatus,
    /// Listing page the product was discovered on (1-based).
    pub page_number: u32,
    pub scraped_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Record for a product whose image was downloaded and verified.
    #[allow(clippy::too_many_arguments)]
    pub fn succeeded(
        canonical_name: String,
        raw_name: String,
        source_link: String,
        original_image_url: String,
        served_image_url: String,
        saved_filename: String,
        page_number: u32,
    ) -> Self {
        Self {
            canonical_name,
            raw_name,
            source_link,
            original_image_url: Some(original_image_url),
            served_image_url: Some(served_image_url),
            saved_filename: Some(saved_filename),
            download_status: DownloadStatus::Success,
            page_number,
            scraped_at: Utc::now(),
        }
    }

    /// Record for a product whose image could not be saved.
    pub fn failed(
        canonical_name: String,
        raw_name: String,
        source_link: String,
        original_image_url: Option<String>,
        reason: String,
        page_number: u32,
    ) -> Self {
        Self {
            canonical_name,
            raw_name,
            source_link,
            original_image_url,
            served_image_url: None,
            saved_filename: None,
            download_status: DownloadStatus::Failed(reason),
            page_number,
            scraped_at: Utc::now(),
        }
    }
}

/// Monotonic filename slot sequence, starting at 1.
///
/// Owned by the orchestrator and advanced only there; values are passed into
/// the fetch step so it cannot influence the numbering.
#[derive(Debug)]
pub struct ImageCounter {
    next: u64,
}

impl ImageCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the current slot and move to the next one.
    pub fn advance(&mut self) -> u64 {
        let slot = self.next;
        self.next += 1;
        slot
    }

    /// Slot the next attempt would receive.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Number of attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.next - 1
    }
}

impl Default for ImageCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Pagination shape of the listing, derived once from the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub total_pages: u32,
    pub has_pagination: bool,
}

impl PaginationState {
    /// A listing without any pagination container.
    pub fn single_page() -> Self {
        Self {
            total_pages: 1,
            has_pagination: false,
        }
    }
}

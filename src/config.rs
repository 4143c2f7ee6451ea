//! Configuration for crawl runs.
//!
//! Settings are plain serde structs with code defaults; an optional TOML file
//! overrides them section by section. Selector lists live here so a storefront
//! markup change is a config edit, not a code change.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scrapers::extract::{ExtractionStrategy, ValueSource};

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Substring identifying the source site's hosts (referer rotation and
    /// image-URL filtering key off this).
    pub source_host: String,
    pub selectors: SelectorSettings,
    pub timing: TimingSettings,
    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_host: "yupoo.com".to_string(),
            selectors: SelectorSettings::default(),
            timing: TimingSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file; defaults when absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let raw = fs::read_to_string(p)?;
                Ok(toml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }
}

/// CSS selectors driving page interaction and extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSettings {
    /// Candidate pagination containers, probed in order.
    pub pagination_containers: Vec<String>,
    /// Page-number link elements inside the pagination container.
    pub page_number_links: String,
    /// Any link carrying a `page=` parameter.
    pub page_links: String,
    /// Product links on a listing page.
    pub product_links: String,
    /// Title extraction strategies, first non-empty wins.
    pub title: Vec<ExtractionStrategy>,
    /// Cover-image extraction strategies, first non-empty wins.
    pub image: Vec<ExtractionStrategy>,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            pagination_containers: vec![
                ".pagination__main".to_string(),
                ".pagination".to_string(),
                "[class*='pagination']".to_string(),
            ],
            page_number_links:
                ".pagination__number, .pagination-number, [class*='pagination'] a[href*='page=']"
                    .to_string(),
            page_links: "a[href*='page=']".to_string(),
            product_links: "a.album__main".to_string(),
            title: vec![
                ExtractionStrategy::new(".showalbumheader__gallerytitle", ValueSource::Text),
                ExtractionStrategy::new(
                    "span[data-name]",
                    ValueSource::TextThenAttribute("data-name".to_string()),
                ),
                ExtractionStrategy::new(".showalbumheader__title", ValueSource::Text),
                ExtractionStrategy::new("h1", ValueSource::Text),
                ExtractionStrategy::new("h2", ValueSource::Text),
            ],
            image: vec![
                ExtractionStrategy::new(
                    ".showalbumheader__gallerycover img",
                    ValueSource::Attribute("src".to_string()),
                )
                .requiring("yupoo.com"),
                ExtractionStrategy::new(
                    ".album-cover img",
                    ValueSource::Attribute("src".to_string()),
                )
                .requiring("yupoo.com"),
                ExtractionStrategy::new(
                    ".gallery img:first-child",
                    ValueSource::Attribute("src".to_string()),
                )
                .requiring("yupoo.com"),
                ExtractionStrategy::new(
                    "img[src*='yupoo.com']",
                    ValueSource::Attribute("src".to_string()),
                )
                .requiring("yupoo.com"),
            ],
        }
    }
}

/// Delays and timeouts, all operator-tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// HTTP timeout for image downloads, seconds.
    pub request_timeout_secs: u64,
    /// Randomized politeness delay before each image fetch, milliseconds.
    pub min_image_delay_ms: u64,
    pub max_image_delay_ms: u64,
    /// Wait budget for the product-link selector on a listing page, seconds.
    pub wait_timeout_secs: u64,
    /// Settle time after navigating to a listing page, milliseconds.
    pub page_settle_ms: u64,
    /// Settle time after opening a product page, milliseconds.
    pub product_settle_ms: u64,
    /// Pause between listing pages when more remain, milliseconds.
    pub page_pause_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            min_image_delay_ms: 500,
            max_image_delay_ms: 2000,
            wait_timeout_secs: 10,
            page_settle_ms: 3000,
            product_settle_ms: 2000,
            page_pause_ms: 2000,
        }
    }
}

/// Output naming and serving conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Base name for the exported tables.
    pub base_name: String,
    /// Host prefix for served-image URLs.
    pub served_base_url: String,
    /// Quality for the canonical lossy re-encode.
    pub jpeg_quality: u8,
    /// Write a snapshot every N listing pages.
    pub snapshot_every_pages: u32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            base_name: "catalog_data".to_string(),
            served_base_url: "http://app.madeinchina-ebook.com".to_string(),
            jpeg_quality: 80,
            snapshot_every_pages: 3,
        }
    }
}

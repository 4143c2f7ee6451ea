//! Pagination discovery on the rendered first page.
//!
//! The storefront localizes and restructures its pagination widget freely, so
//! the page count is derived from a ladder of heuristics. The first one that
//! yields a positive number wins; a listing without a pagination container is
//! a normal single-page outcome, never an error.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::config::SelectorSettings;
use crate::models::PaginationState;
use crate::scrapers::browser::PageDriver;

static TOTAL_PAGES_FR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"au total (\d+) pages?").unwrap());
static TOTAL_PAGES_EN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"total (\d+) pages?").unwrap());
static PAGE_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"page=(\d+)").unwrap());

/// Detects pagination shape from the rendered listing page.
pub struct PaginationDetector<'a> {
    selectors: &'a SelectorSettings,
}

impl<'a> PaginationDetector<'a> {
    pub fn new(selectors: &'a SelectorSettings) -> Self {
        Self { selectors }
    }

    /// Inspect the already-navigated first page.
    pub async fn detect(&self, driver: &mut dyn PageDriver) -> PaginationState {
        let container = {
            let mut found = None;
            for selector in &self.selectors.pagination_containers {
                if let Some(element) = driver.find_one(selector).await {
                    debug!("Pagination container matched: {}", selector);
                    found = Some(element);
                    break;
                }
            }
            found
        };

        let Some(container) = container else {
            info!("No pagination found - single page listing");
            return PaginationState::single_page();
        };

        let mut total_pages = self.from_total_phrase(&container.text);
        if total_pages.is_none() {
            total_pages = self.from_link_count(driver).await;
        }
        if total_pages.is_none() {
            total_pages = self.from_max_page_param(driver).await;
        }
        let total_pages = total_pages.unwrap_or(1);

        info!("Pagination detected: {} pages", total_pages);
        PaginationState {
            total_pages,
            has_pagination: true,
        }
    }

    /// Heuristics 1 and 2: a localized "total N pages" phrase in the
    /// container text.
    fn from_total_phrase(&self, text: &str) -> Option<u32> {
        let lowercase = text.to_lowercase();
        let captures = TOTAL_PAGES_FR
            .captures(text)
            .or_else(|| TOTAL_PAGES_EN.captures(&lowercase))?;
        captures[1].parse().ok().filter(|&n| n > 0)
    }

    /// Heuristic 3: count of page-number link elements.
    async fn from_link_count(&self, driver: &mut dyn PageDriver) -> Option<u32> {
        let count = driver.find_all(&self.selectors.page_number_links).await.len();
        (count > 0).then_some(count as u32)
    }

    /// Heuristic 4: highest `page=` parameter across pagination links.
    async fn from_max_page_param(&self, driver: &mut dyn PageDriver) -> Option<u32> {
        driver
            .find_all(&self.selectors.page_links)
            .await
            .iter()
            .filter_map(|link| link.attr("href"))
            .filter_map(|href| PAGE_PARAM.captures(href))
            .filter_map(|c| c[1].parse::<u32>().ok())
            .max()
            .filter(|&n| n > 0)
    }
}

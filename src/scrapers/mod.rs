//! Network-facing layer: browser driver, HTTP session, extraction, pagination.

pub mod browser;
pub mod extract;
mod http_client;
pub mod pagination;

pub use browser::{ChromeDriver, ElementSnapshot, PageDriver};
pub use http_client::{random_user_agent, CrawlSession, USER_AGENTS};
pub use pagination::PaginationDetector;

use std::sync::LazyLock;

use regex::Regex;

static PAGE_PARAM_MID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&page=\d+").unwrap());
static PAGE_PARAM_FIRST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?page=\d+&?").unwrap());
static TRAILING_QUESTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?$").unwrap());

/// Strip any `page=` parameter from an operator-supplied category URL so the
/// crawl always starts from page one.
pub fn clean_base_url(url: &str) -> String {
    let url = url.trim();
    if !url.contains("page=") {
        return url.to_string();
    }
    let url = PAGE_PARAM_MID.replace_all(url, "");
    let url = PAGE_PARAM_FIRST.replace_all(&url, "?");
    TRAILING_QUESTION.replace(&url, "").into_owned()
}

/// URL for a specific listing page.
///
/// Page one and unpaginated listings use the base URL untouched.
pub fn build_page_url(base_url: &str, page_num: u32, has_pagination: bool) -> String {
    if !has_pagination || page_num == 1 {
        return base_url.to_string();
    }
    let separator = if base_url.contains('?') { "&" } else { "?" };
    format!("{}{}page={}", base_url, separator, page_num)
}

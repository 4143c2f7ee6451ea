//! Page driver capability set.
//!
//! The crawl consumes the browser through this narrow trait: navigation,
//! selector queries, a bounded wait, and a secondary navigation context for
//! product pages. Production uses the chromiumoxide implementation; tests
//! substitute an in-memory driver over static HTML.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScrapeError;

/// Attributes captured for every matched element.
pub const SNAPSHOT_ATTRS: &[&str] = &["href", "src", "data-name"];

/// A detached view of a DOM element: its text and the attributes the
/// extraction layer cares about.
#[derive(Debug, Clone, Default)]
pub struct ElementSnapshot {
    pub text: String,
    pub attrs: HashMap<String, String>,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }
}

/// Browser capability set consumed by the crawl.
///
/// Queries run against the secondary context while one is open, otherwise
/// against the primary page.
#[async_trait]
pub trait PageDriver: Send {
    /// Drive the primary context to `url`.
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Block until `selector` is present or the timeout elapses.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// First element matching `selector`, if any. Driver-level errors are
    /// treated as a miss.
    async fn find_one(&mut self, selector: &str) -> Option<ElementSnapshot>;

    /// All elements matching `selector`.
    async fn find_all(&mut self, selector: &str) -> Vec<ElementSnapshot>;

    /// Open the secondary context (tab equivalent) on a product page. At most
    /// one is open at a time; callers must pair this with `close_secondary`
    /// on every exit path.
    async fn open_secondary(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Close the secondary context if one is open. Idempotent.
    async fn close_secondary(&mut self);
}

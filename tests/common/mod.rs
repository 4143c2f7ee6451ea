//! In-memory page driver over static HTML fixtures.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use albumgrab::error::ScrapeError;
use albumgrab::scrapers::{ElementSnapshot, PageDriver};

const SNAPSHOT_ATTRS: &[&str] = &["href", "src", "data-name"];

/// Driver whose "pages" are canned HTML strings keyed by URL.
///
/// Documents are re-parsed per query; nothing non-thread-safe is held across
/// await points.
pub struct StaticDriver {
    pages: HashMap<String, String>,
    primary: Option<String>,
    secondary: Option<String>,
    pub visited: Vec<String>,
}

impl StaticDriver {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            primary: None,
            secondary: None,
            visited: Vec::new(),
        }
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn secondary_open(&self) -> bool {
        self.secondary.is_some()
    }

    fn active(&self) -> Option<&str> {
        self.secondary
            .as_deref()
            .or(self.primary.as_deref())
    }

    fn query(&self, selector: &str, limit: Option<usize>) -> Vec<ElementSnapshot> {
        let Some(html) = self.active() else {
            return Vec::new();
        };
        let Ok(parsed) = Selector::parse(selector) else {
            return Vec::new();
        };
        let document = Html::parse_document(html);
        let mut out = Vec::new();
        for element in document.select(&parsed) {
            let mut attrs = HashMap::new();
            for name in SNAPSHOT_ATTRS {
                if let Some(value) = element.value().attr(name) {
                    attrs.insert(name.to_string(), value.to_string());
                }
            }
            out.push(ElementSnapshot {
                text: element.text().collect::<String>(),
                attrs,
            });
            if limit.is_some_and(|n| out.len() >= n) {
                break;
            }
        }
        out
    }
}

#[async_trait]
impl PageDriver for StaticDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.visited.push(url.to_string());
        match self.pages.get(url) {
            Some(html) => {
                self.primary = Some(html.clone());
                Ok(())
            }
            None => Err(ScrapeError::NavigationFailed(format!(
                "no fixture for {}",
                url
            ))),
        }
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<(), ScrapeError> {
        if self.query(selector, Some(1)).is_empty() {
            Err(ScrapeError::NavigationFailed(format!(
                "selector never appeared: {}",
                selector
            )))
        } else {
            Ok(())
        }
    }

    async fn find_one(&mut self, selector: &str) -> Option<ElementSnapshot> {
        self.query(selector, Some(1)).into_iter().next()
    }

    async fn find_all(&mut self, selector: &str) -> Vec<ElementSnapshot> {
        self.query(selector, None)
    }

    async fn open_secondary(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.visited.push(url.to_string());
        match self.pages.get(url) {
            Some(html) => {
                self.secondary = Some(html.clone());
                Ok(())
            }
            None => Err(ScrapeError::NavigationFailed(format!(
                "no fixture for {}",
                url
            ))),
        }
    }

    async fn close_secondary(&mut self) {
        self.secondary = None;
    }
}

/// Small but poorly-compressible PNG, comfortably above the size floor.
pub fn sample_png() -> Vec<u8> {
    use image::{ImageBuffer, Rgb};

    let img = ImageBuffer::from_fn(160, 120, |x, y| {
        Rgb([
            (x * 7 % 256) as u8,
            (y * 13 % 256) as u8,
            ((x * y) % 256) as u8,
        ])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    assert!(bytes.len() > 1000, "fixture image must beat the size floor");
    bytes
}

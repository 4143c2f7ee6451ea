//! Chromium-backed page driver for JS-rendered storefronts.
//!
//! Listing and product pages are rendered client-side, so DOM queries go
//! through a real browser over CDP. Image loading is disabled; pixels are
//! fetched separately through the HTTP session.

mod driver;

pub use driver::{ElementSnapshot, PageDriver, SNAPSHOT_ATTRS};

use std::time::Duration;

#[cfg(feature = "browser")]
use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tracing::{debug, info};

use crate::error::ScrapeError;

/// Poll interval for selector waits.
#[cfg(feature = "browser")]
const WAIT_POLL_MS: u64 = 250;

/// Page driver running a headless Chromium instance.
#[cfg(feature = "browser")]
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    secondary: Option<Page>,
}

#[cfg(feature = "browser")]
impl ChromeDriver {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find a Chrome/Chromium executable.
    fn find_chrome() -> Result<std::path::PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
        ))
    }

    /// Launch a headless browser and open the primary page.
    pub async fn launch(headless: bool) -> Result<Self> {
        info!("Launching browser (headless={})", headless);

        let chrome_path = Self::find_chrome()?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1920, 1080);

        // with_head means NOT headless, confusingly
        if !headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--no-sandbox") // Often needed for headless in containers/restricted environments
            .arg("--disable-gpu") // Recommended for headless
            // Pixels come through the HTTP session; skipping image loads
            // keeps page rendering fast.
            .arg("--blink-settings=imagesEnabled=false");

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open initial page")?;

        Ok(Self {
            browser,
            page,
            secondary: None,
        })
    }

    /// Shut the browser down.
    pub async fn close(mut self) {
        if let Some(page) = self.secondary.take() {
            let _ = page.close().await;
        }
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
    }

    /// Context queries run against: the secondary page while open.
    fn active(&self) -> &Page {
        self.secondary.as_ref().unwrap_or(&self.page)
    }

    async fn snapshot(element: &Element) -> ElementSnapshot {
        let text = element
            .inner_text()
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
            .trim()
            .to_string();

        let mut attrs = std::collections::HashMap::new();
        for name in SNAPSHOT_ATTRS {
            if let Ok(Some(value)) = element.attribute(name).await {
                attrs.insert((*name).to_string(), value);
            }
        }

        ElementSnapshot { text, attrs }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        debug!("Navigating to {}", url);
        let nav_timeout = Duration::from_secs(30);
        tokio::time::timeout(nav_timeout, self.page.goto(url))
            .await
            .map_err(|_| ScrapeError::NavigationFailed(format!("navigation timed out: {}", url)))?
            .map_err(|e| ScrapeError::NavigationFailed(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.active().find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::NavigationFailed(format!(
                    "timed out waiting for selector {}",
                    selector
                )));
            }
            tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }
    }

    async fn find_one(&mut self, selector: &str) -> Option<ElementSnapshot> {
        match self.active().find_element(selector).await {
            Ok(element) => Some(Self::snapshot(&element).await),
            Err(_) => None,
        }
    }

    async fn find_all(&mut self, selector: &str) -> Vec<ElementSnapshot> {
        let elements = match self.active().find_elements(selector).await {
            Ok(elements) => elements,
            Err(_) => return Vec::new(),
        };

        let mut snapshots = Vec::with_capacity(elements.len());
        for element in &elements {
            snapshots.push(Self::snapshot(element).await);
        }
        snapshots
    }

    async fn open_secondary(&mut self, url: &str) -> Result<(), ScrapeError> {
        // Replace any leftover secondary context first.
        self.close_secondary().await;

        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| ScrapeError::NavigationFailed(format!("{}: {}", url, e)))?;
        self.secondary = Some(page);
        Ok(())
    }

    async fn close_secondary(&mut self) {
        if let Some(page) = self.secondary.take() {
            let _ = page.close().await;
        }
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromeDriver;

#[cfg(not(feature = "browser"))]
impl ChromeDriver {
    pub async fn launch(_headless: bool) -> Result<Self> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }

    pub async fn close(self) {}
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&mut self, _url: &str) -> Result<(), ScrapeError> {
        Err(ScrapeError::NavigationFailed(
            "browser support not compiled".to_string(),
        ))
    }

    async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> Result<(), ScrapeError> {
        Err(ScrapeError::NavigationFailed(
            "browser support not compiled".to_string(),
        ))
    }

    async fn find_one(&mut self, _selector: &str) -> Option<ElementSnapshot> {
        None
    }

    async fn find_all(&mut self, _selector: &str) -> Vec<ElementSnapshot> {
        Vec::new()
    }

    async fn open_secondary(&mut self, _url: &str) -> Result<(), ScrapeError> {
        Err(ScrapeError::NavigationFailed(
            "browser support not compiled".to_string(),
        ))
    }

    async fn close_secondary(&mut self) {}
}

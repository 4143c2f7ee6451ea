//! Anti-bot HTTP session for image downloads.
//!
//! One session is created per run and passed into every fetch call. It owns
//! the header posture that keeps CDN bot-detection quiet: a real browser user
//! agent, the full navigation header set, and a referer that is rotated to
//! the image host whenever the image lives on the source site. Access is
//! strictly serial; a concurrent redesign would need a session per worker.

mod user_agent;

pub use user_agent::{random_user_agent, USER_AGENTS};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use url::Url;

/// HTTP session with anti-bot headers and rotating referer.
pub struct CrawlSession {
    client: Client,
    source_host: String,
    referer: String,
}

impl CrawlSession {
    /// Create a session for one run.
    ///
    /// `source_host` is the substring identifying the source site's hosts;
    /// requests to matching hosts get a same-site referer.
    pub fn new(source_host: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(
            "Accept-Language",
            HeaderValue::from_static("fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
        headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
        headers.insert("Cache-Control", HeaderValue::from_static("max-age=0"));

        let client = Client::builder()
            .user_agent(random_user_agent())
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            source_host: source_host.to_string(),
            referer: "https://www.google.com/".to_string(),
        })
    }

    /// Point the referer at the image's own host when it belongs to the
    /// source site. Hotlink checks on those CDNs expect a same-site referer.
    pub fn refresh_referer_for(&mut self, url: &Url) {
        if let Some(host) = url.host_str() {
            if host.contains(&self.source_host) {
                self.referer = format!("https://{}/", host);
            }
        }
    }

    /// Current referer header value.
    pub fn referer(&self) -> &str {
        &self.referer
    }

    /// Issue a GET with the session posture, following redirects.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(url)
            .header("Referer", self.referer.clone())
            .send()
            .await
    }
}

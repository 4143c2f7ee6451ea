//! Failure taxonomy for the crawl.
//!
//! Every failure mode a single product can hit is a variant here. Per-product
//! failures are recorded on the row and never abort the page loop; page-level
//! failures (navigation, wait timeout) abort only that page.

use thiserror::Error;

/// Errors that can occur while acquiring a product or its image.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// URL scheme is not http/https.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Server answered with a non-200 status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Timeout or connection-level failure.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response looks like an anti-bot stub instead of a real image.
    #[error("placeholder image detected")]
    PlaceholderDetected,

    /// Image bytes could not be decoded or re-encoded.
    #[error("image conversion failed: {0}")]
    ConversionFailed(String),

    /// File was written but the read-back check found it missing or empty.
    #[error("write verification failed: {0}")]
    WriteVerificationFailed(String),

    /// No selector in the fallback chain produced a value.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// Browser navigation or selector wait did not complete.
    #[error("navigation failed: {0}")]
    NavigationFailed(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ScrapeError::HttpStatus(status.as_u16());
        }
        ScrapeError::NetworkError(err.to_string())
    }
}

pub mod crawl;
pub mod image;
pub mod reconcile;

pub use crawl::{CrawlOrchestrator, CrawlOutcome, RunFolder};
pub use image::ImageFetcher;
pub use reconcile::{reconcile, ReconciliationReport};

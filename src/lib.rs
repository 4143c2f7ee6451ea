//! albumgrab - product catalog acquisition for JS-rendered album storefronts.
//!
//! Walks a paginated listing through a headless browser, normalizes product
//! titles, downloads and canonicalizes cover images over a separate HTTP
//! session, and exports the catalog as CSV and XLSX with a reconciliation
//! pass at the end.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod naming;
pub mod scrapers;
pub mod services;

pub use error::ScrapeError;

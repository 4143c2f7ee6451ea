//! Data models for albumgrab.

mod product;

pub use product::{DownloadStatus, ImageCounter, PaginationState, ProductRecord};

//! Canonical image re-encoding.
//!
//! Every archived image is stored in one lossy format regardless of what the
//! source served, so the serving layer never has to sniff types. Alpha and
//! palette inputs are flattened to opaque RGB first; alpha carries no meaning
//! for catalog photos.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::ScrapeError;

/// Extension of the canonical format.
pub const CANONICAL_EXT: &str = "jpg";

/// Default re-encode quality.
pub const DEFAULT_QUALITY: u8 = 80;

/// Decode arbitrary raster bytes and re-encode them canonically.
///
/// Fails with `ConversionFailed` on undecodable input; never panics.
pub fn to_canonical(data: &[u8], quality: u8) -> Result<Vec<u8>, ScrapeError> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| ScrapeError::ConversionFailed(e.to_string()))?;

    // to_rgb8 drops alpha and expands palettes; grayscale widens to RGB.
    let flattened = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    flattened
        .write_with_encoder(encoder)
        .map_err(|e| ScrapeError::ConversionFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

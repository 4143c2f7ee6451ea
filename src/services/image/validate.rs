//! Placeholder image detection.
//!
//! Anti-bot and CDN layers on the source site serve tiny stub images or
//! redirect to generic error assets instead of returning an HTTP error, so a
//! 200 response is not proof of a real image. These heuristics catch the
//! silent-corruption cases.

/// URL fragments that mark a redirect target as a stand-in asset.
pub const PLACEHOLDER_INDICATORS: &[&str] = &[
    "placeholder",
    "default",
    "error",
    "not-found",
    "404",
    "forbidden",
    "unavailable",
    "res/703.gif",
    "static/error",
];

/// Bodies smaller than this are stub images, not catalog photos.
pub const MIN_IMAGE_BYTES: usize = 1000;

/// Decide whether a completed response is a placeholder rather than a real
/// image. `final_url` is the post-redirect URL.
pub fn is_placeholder(body_len: usize, final_url: &str, content_type: Option<&str>) -> bool {
    if body_len < MIN_IMAGE_BYTES {
        tracing::debug!("Image too small ({} bytes) - probably a placeholder", body_len);
        return true;
    }

    let final_url = final_url.to_lowercase();
    for indicator in PLACEHOLDER_INDICATORS {
        if final_url.contains(indicator) {
            tracing::debug!("Placeholder URL detected: {}", indicator);
            return true;
        }
    }

    if let Some(content_type) = content_type {
        let content_type = content_type.to_lowercase();
        if !content_type.is_empty() && !content_type.starts_with("image/") {
            tracing::debug!("Invalid content type: {}", content_type);
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_bodies_are_placeholders() {
        assert!(is_placeholder(500, "https://photo.yupoo.com/x.jpg", Some("image/jpeg")));
    }

    #[test]
    fn error_urls_are_placeholders() {
        assert!(is_placeholder(
            50_000,
            "https://cdn.yupoo.com/static/404.png",
            Some("image/png")
        ));
        assert!(is_placeholder(
            50_000,
            "https://cdn.yupoo.com/res/703.gif",
            Some("image/gif")
        ));
    }

    #[test]
    fn non_image_content_type_is_a_placeholder() {
        assert!(is_placeholder(
            50_000,
            "https://photo.yupoo.com/x.jpg",
            Some("text/html; charset=utf-8")
        ));
    }

    #[test]
    fn real_images_pass() {
        assert!(!is_placeholder(
            50_000,
            "https://photo.yupoo.com/shop/cover.jpg",
            Some("image/jpeg")
        ));
    }

    #[test]
    fn missing_content_type_is_tolerated() {
        assert!(!is_placeholder(50_000, "https://photo.yupoo.com/x.jpg", None));
    }
}

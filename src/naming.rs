//! Product title normalization.
//!
//! Storefront titles are noisy multilingual marketing strings mixing CJK
//! text, product codes, and size ranges. This module reduces them to a
//! compact, filesystem-safe identifier of at most two tokens and twenty
//! characters. The pipeline is a fixed sequence of total transformations;
//! titles that reduce to nothing yield the `PRODUCT` sentinel.

use std::sync::LazyLock;

use regex::Regex;

/// Returned when a title reduces to nothing after cleaning.
pub const SENTINEL: &str = "PRODUCT";

/// Maximum length of a normalized name.
const MAX_LEN: usize = 20;

/// Ordered strip patterns applied before tokenization.
///
/// Order matters: later patterns assume earlier noise (leading counts, CJK
/// runs, product codes) is already gone.
static STRIP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Leading numeric run ("200 Shoe" -> "Shoe").
        r"^\d+\s*",
        // CJK and Hangul code-point ranges.
        r"[一-鿿㐀-䶿぀-ゟ゠-ヿ가-힯]+",
        // Product codes like HM6803-004 and 03YHLS12.
        r"[A-Z]{2,}\d{4,}-\d{3,}",
        r"\d{2,}[A-Z]{2,}\d{2,}",
        // Labeled code ("货号: CODE").
        r"货号[：:][A-Z0-9-]+",
        // Size ranges ("Size 36 46", "36-45").
        r"(?i)Size\s*\d{2}\s*-?\s*\d{2}",
        r"\d{2}-\d{2}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid strip pattern"))
    .collect()
});

/// Stop words removed as whole words, case-insensitively.
static STOP_WORDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["货号", "Size", "Teal", "Blue", "-", "_"]
        .iter()
        .map(|w| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w))).expect("invalid stop word")
        })
        .collect()
});

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PURE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static V_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^V?\d+$").unwrap());
static VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3}V\d+$").unwrap());

/// Normalize a raw product title into a canonical identifier.
///
/// Total over all inputs; never panics and never returns an empty string.
pub fn normalize(raw_title: &str) -> String {
    let mut name = raw_title.to_string();

    for pattern in STRIP_PATTERNS.iter() {
        name = pattern.replace_all(&name, "").into_owned();
    }
    for word in STOP_WORDS.iter() {
        name = word.replace_all(&name, "").into_owned();
    }

    let name = PUNCTUATION.replace_all(&name, " ");
    let name = WHITESPACE.replace_all(&name, " ");
    let name = name.trim();

    if name.is_empty() {
        return SENTINEL.to_string();
    }

    // Tokenize, uppercase, and keep only meaningful tokens: single chars go,
    // bare numbers and V-prefixed numbers go, but version-style tokens like
    // 700V2 stay.
    let meaningful: Vec<String> = name
        .split_whitespace()
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_uppercase())
        .filter(|t| {
            VERSION_TOKEN.is_match(t) || (!PURE_DIGITS.is_match(t) && !V_DIGITS.is_match(t))
        })
        .collect();

    let result = match meaningful.len() {
        0 => SENTINEL.to_string(),
        1 => meaningful[0].clone(),
        _ => format!("{}_{}", meaningful[0], meaningful[1]),
    };

    result.chars().take(MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_title_with_codes_and_sizes() {
        assert_eq!(normalize("200 HM6803-004 Size 36-45 YEEZY 700V2"), "YEEZY_700V2");
    }

    #[test]
    fn keeps_at_most_two_tokens() {
        assert_eq!(normalize("Air Jordan Retro High OG"), "AIR_JORDAN");
    }

    #[test]
    fn single_surviving_token_stands_alone() {
        assert_eq!(normalize("YEEZY 42"), "YEEZY");
    }

    #[test]
    fn all_cjk_title_reduces_to_sentinel() {
        assert_eq!(normalize("莆田鞋工厂直销"), SENTINEL);
    }

    #[test]
    fn empty_and_noise_only_titles_reduce_to_sentinel() {
        assert_eq!(normalize(""), SENTINEL);
        assert_eq!(normalize("   "), SENTINEL);
        assert_eq!(normalize("200 36-45"), SENTINEL);
    }

    #[test]
    fn strips_leading_numeric_run() {
        assert_eq!(normalize("200 Shoe"), "SHOE");
    }

    #[test]
    fn drops_bare_numbers_and_v_numbers_but_keeps_versions() {
        assert_eq!(normalize("Runner V2 700V2"), "RUNNER_700V2");
    }

    #[test]
    fn strips_stop_words_case_insensitively() {
        assert_eq!(normalize("Dunk TEAL blue Low"), "DUNK_LOW");
    }

    #[test]
    fn result_is_never_longer_than_twenty_chars() {
        let out = normalize("Superlongproductnameexceedinglimits Anotherlongword");
        assert!(out.chars().count() <= 20);
        assert!(!out.is_empty());
    }

    #[test]
    fn mixed_cjk_and_latin_keeps_latin_tokens() {
        assert_eq!(normalize("新款 Jordan 4 复刻"), "JORDAN");
    }

    #[test]
    fn punctuation_becomes_token_separator() {
        assert_eq!(normalize("Dunk/Low*Panda"), "DUNK_LOW");
    }
}

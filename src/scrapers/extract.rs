//! Selector-fallback extraction.
//!
//! Storefront markup is inconsistent, so every value is described by an
//! ordered list of strategies. Each strategy is a selector plus a way to read
//! a value out of the match; the first strategy producing a non-empty value
//! wins. A miss is an `Option::None`, never an error.

use serde::{Deserialize, Serialize};

use crate::scrapers::browser::{ElementSnapshot, PageDriver};

/// Where a strategy reads its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Element inner text.
    Text,
    /// A named attribute.
    Attribute(String),
    /// Inner text, falling back to a named attribute when the text is empty.
    TextThenAttribute(String),
}

/// One entry in a fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionStrategy {
    pub selector: String,
    pub source: ValueSource,
    /// Reject values not containing this substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_contain: Option<String>,
}

impl ExtractionStrategy {
    pub fn new(selector: &str, source: ValueSource) -> Self {
        Self {
            selector: selector.to_string(),
            source,
            must_contain: None,
        }
    }

    /// Require the extracted value to contain `substring`.
    pub fn requiring(mut self, substring: &str) -> Self {
        self.must_contain = Some(substring.to_string());
        self
    }

    /// Read this strategy's value out of a matched element.
    pub fn read(&self, element: &ElementSnapshot) -> Option<String> {
        let value = match &self.source {
            ValueSource::Text => Some(element.text.clone()),
            ValueSource::Attribute(name) => element.attr(name).map(|s| s.to_string()),
            ValueSource::TextThenAttribute(name) => {
                if element.text.is_empty() {
                    element.attr(name).map(|s| s.to_string())
                } else {
                    Some(element.text.clone())
                }
            }
        };

        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match (&value, &self.must_contain) {
            (Some(v), Some(needle)) if !v.contains(needle.as_str()) => None,
            _ => value,
        }
    }
}

/// Run a fallback chain against the driver's active context.
pub async fn first_match(
    driver: &mut dyn PageDriver,
    strategies: &[ExtractionStrategy],
) -> Option<String> {
    for strategy in strategies {
        if let Some(element) = driver.find_one(&strategy.selector).await {
            if let Some(value) = strategy.read(&element) {
                return Some(value);
            }
        }
    }
    None
}

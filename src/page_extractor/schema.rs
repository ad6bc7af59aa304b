use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// Records per selector, in the order the selectors were given
pub type SelectorRecords = IndexMap<String, Vec<PageRecord>>;

/// One element matched by an extraction selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PageRecord {
    /// Visible text with whitespace collapsed
    pub text: String,
    /// Inner markup of the element
    pub html: String,
}

impl PageRecord {
    #[must_use]
    pub fn new(text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: html.into(),
        }
    }

    /// A record is kept only if it carries text or markup
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.html.is_empty()
    }
}

/// Everything read from a page during one navigation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Records per selector; a selector that failed maps to an empty list
    pub records: SelectorRecords,
    /// Raw `href` values of anchors, only when links were requested
    pub links: Vec<String>,
    pub raw_html: String,
}

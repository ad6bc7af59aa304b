//! Text and record cleaning
//!
//! Whitespace is collapsed to single spaces, empty entries are dropped and
//! duplicates removed keeping the first occurrence.

use std::collections::HashSet;

use crate::page_extractor::schema::{PageRecord, SelectorRecords};

/// Collapse every whitespace run into one space and trim the ends
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a list of strings
///
/// ```
/// use ghostcrawl::cleaner::clean_texts;
///
/// let cleaned = clean_texts(["foo  bar", "foo bar", ""]);
/// assert_eq!(cleaned, vec!["foo bar".to_string()]);
/// ```
pub fn clean_texts<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for text in texts {
        let normalized = collapse_whitespace(text.as_ref());
        if !normalized.is_empty() && seen.insert(normalized.clone()) {
            cleaned.push(normalized);
        }
    }

    cleaned
}

/// Clean a list of records
///
/// Records are deduplicated on `(text, html)` after whitespace collapsing;
/// records with neither text nor markup are dropped.
#[must_use]
pub fn clean_records(records: &[PageRecord]) -> Vec<PageRecord> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(records.len());

    for record in records {
        let normalized = PageRecord::new(collapse_whitespace(&record.text), record.html.clone());
        if normalized.is_empty() {
            continue;
        }
        if seen.insert((normalized.text.clone(), normalized.html.clone())) {
            cleaned.push(normalized);
        }
    }

    cleaned
}

/// Clean every selector's records
#[must_use]
pub fn clean_page_data(
    data: &SelectorRecords,
) -> SelectorRecords {
    data.iter()
        .map(|(selector, records)| (selector.clone(), clean_records(records)))
        .collect()
}

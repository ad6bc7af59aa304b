//! Page data extraction functions.
//!
//! This module provides the record types produced by a fetch and the
//! chromiumoxide functions that read them off a live page.

// Sub-modules
pub mod extractors;
pub mod schema;

// Re-exports for public API
pub use extractors::{collect_links, extract_all, extract_records, wait_for_selector};
pub use schema::{PageRecord, PageSnapshot, SelectorRecords};

//! Result persistence

mod json_saver;

use futures::future::BoxFuture;
use std::path::PathBuf;

use crate::crawl_engine::crawl_types::ScrapeResult;

pub use json_saver::JsonStorage;

/// Where cleaned results go
pub trait Storage: Send + Sync {
    /// Write `payload` under a name derived from `stem`, returning its location
    fn persist<'a>(
        &'a self,
        payload: serde_json::Value,
        stem: &'a str,
    ) -> BoxFuture<'a, ScrapeResult<PathBuf>>;
}

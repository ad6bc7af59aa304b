use chrono::Utc;
use futures::future::BoxFuture;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::{info, warn};

use super::Storage;
use crate::crawl_engine::crawl_types::{ScrapeError, ScrapeResult};

/// Timeout for blocking JSON serialization
/// Prevents hangs on pathological data structures
const BLOCKING_SERIALIZATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on `_N` suffixes tried for one stem and second
const MAX_COLLISION_SUFFIX: u32 = 1000;

/// Writes each payload to `{stem}_{YYYYMMDDTHHMMSSZ}.json` under one directory
#[derive(Debug, Clone)]
pub struct JsonStorage {
    base: PathBuf,
}

impl JsonStorage {
    /// Use `base` as the output directory, creating it if needed
    ///
    /// # Errors
    /// `ScrapeError::Persist` when the directory cannot be created.
    pub fn new(base: impl Into<PathBuf>) -> ScrapeResult<Self> {
        let base = base.into();
        std::fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    async fn write(&self, payload: serde_json::Value, stem: &str) -> ScrapeResult<PathBuf> {
        // JSON serialization (spawn_blocking - CPU intensive on large crawls)
        let blocking_task = tokio::task::spawn_blocking(move || serde_json::to_vec_pretty(&payload));
        let bytes = match timeout(BLOCKING_SERIALIZATION_TIMEOUT, blocking_task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                return Err(ScrapeError::Persist(std::io::Error::other(format!(
                    "JSON serialization task panicked: {e}"
                ))));
            }
            Err(_) => {
                warn!("JSON serialization timeout (timeout: {BLOCKING_SERIALIZATION_TIMEOUT:?})");
                return Err(ScrapeError::Persist(std::io::Error::new(
                    ErrorKind::TimedOut,
                    "JSON serialization timed out",
                )));
            }
        };

        let stem = sanitize_stem(stem);
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

        for suffix in 0..MAX_COLLISION_SUFFIX {
            let path = self.base.join(file_name(&stem, &stamp, suffix));
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match file {
                Ok(mut file) => {
                    file.write_all(&bytes).await?;
                    file.flush().await?;
                    info!("Saved: {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(ScrapeError::Persist(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("too many outputs for stem '{stem}' at {stamp}"),
        )))
    }
}

fn file_name(stem: &str, stamp: &str, suffix: u32) -> String {
    if suffix == 0 {
        format!("{stem}_{stamp}.json")
    } else {
        format!("{stem}_{stamp}_{suffix}.json")
    }
}

/// Keep stems to one safe path component
fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        crate::utils::constants::DEFAULT_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

impl Storage for JsonStorage {
    fn persist<'a>(
        &'a self,
        payload: serde_json::Value,
        stem: &'a str,
    ) -> BoxFuture<'a, ScrapeResult<PathBuf>> {
        Box::pin(self.write(payload, stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[tokio::test]
    async fn filename_follows_stem_and_utc_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("nested")).unwrap();

        let path = storage
            .persist(serde_json::json!({"h1": ["Título"]}), "products")
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        let pattern = Regex::new(r"^products_\d{8}T\d{6}Z(_\d+)?\.json$").unwrap();
        assert!(pattern.is_match(name), "unexpected file name {name}");

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Título"), "non-ASCII must be written verbatim");
        assert!(written.contains('\n'), "output is pretty-printed");
    }

    #[tokio::test]
    async fn same_second_collisions_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).unwrap();

        let mut paths = Vec::new();
        for i in 0..3 {
            paths.push(
                storage
                    .persist(serde_json::json!({ "i": i }), "dup")
                    .await
                    .unwrap(),
            );
        }

        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn stems_are_single_components() {
        assert_eq!(sanitize_stem("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_stem("shop run"), "shop_run");
        assert_eq!(sanitize_stem(""), "scrape");
    }
}

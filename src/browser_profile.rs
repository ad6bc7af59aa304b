//! Chrome profile directory management
//!
//! Every launch gets its own UUID-named profile directory, so relaunches and
//! parallel processes never contend for Chrome's SingletonLock.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const PROFILE_PREFIX: &str = "ghostcrawl_chrome";

/// RAII wrapper for a Chrome profile directory
///
/// The directory is removed on drop.
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
}

impl BrowserProfile {
    /// Get reference to the profile directory path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.path.exists() {
            debug!("Removing browser profile {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!(
                    "Failed to cleanup profile directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Create a unique Chrome profile directory under the system temp dir
///
/// # Errors
/// Fails if the directory cannot be created.
pub fn create_unique_profile() -> Result<BrowserProfile> {
    create_unique_profile_in(&std::env::temp_dir())
}

/// Create a unique Chrome profile directory under `parent`
///
/// # Errors
/// Fails if the directory cannot be created.
pub fn create_unique_profile_in(parent: &Path) -> Result<BrowserProfile> {
    let path = parent.join(format!("{PROFILE_PREFIX}_{}", Uuid::new_v4()));

    // create_dir (not create_dir_all) so a collision is an error
    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    info!("Created Chrome profile directory: {}", path.display());
    Ok(BrowserProfile { path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_unique_and_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();

        let first = create_unique_profile_in(parent.path()).unwrap();
        let second = create_unique_profile_in(parent.path()).unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().is_dir());

        let kept = first.path().to_path_buf();
        drop(first);
        assert!(!kept.exists());
        assert!(second.path().is_dir());
    }
}

//! Process logging setup
//!
//! Library code only emits `tracing` events. The binary constructs one
//! [`LogContext`], which installs a stderr layer and, optionally, a plain-text
//! file layer. `RUST_LOG` overrides the default level.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

static INSTALLED: OnceLock<LogContext> = OnceLock::new();

/// Handle to the installed subscriber
#[derive(Debug, Clone)]
pub struct LogContext {
    log_file: Option<PathBuf>,
}

impl LogContext {
    /// Install logging once per process
    ///
    /// Later calls return the first context unchanged, whatever arguments
    /// they pass.
    ///
    /// # Arguments
    /// * `default_level` - Filter used when `RUST_LOG` is unset, e.g. `"info"`
    /// * `log_dir` - Directory for `ghostcrawl.log`; `None` logs to stderr only
    ///
    /// # Errors
    /// Fails if the log directory or file cannot be created.
    pub fn init(default_level: &str, log_dir: Option<&Path>) -> Result<&'static LogContext> {
        if let Some(context) = INSTALLED.get() {
            return Ok(context);
        }

        let (file, log_file) = match log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
                let path = dir.join("ghostcrawl.log");
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?;
                (Some(file), Some(path))
            }
            None => (None, None),
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let file_layer = file.map(|file: File| {
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
        });

        // Another subscriber may already be installed (tests, embedding apps)
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(file_layer)
            .try_init();

        Ok(INSTALLED.get_or_init(|| LogContext { log_file }))
    }

    /// Path of the log file, if file logging is enabled
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

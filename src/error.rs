//! Error types for scrape runs
//!
//! `ScrapeError` is the crate-wide taxonomy. Configuration errors and
//! cancellation before launch end the run; navigation and timeout errors
//! end one topic. Filter backend and sync errors are logged and the run
//! continues. Image failures stay on the pin as
//! [`DownloadError`](crate::downloader::DownloadError) and never surface here.

use std::time::Duration;

use crate::config::ConfigError;
use crate::content_filter::ClassifierError;
use crate::remote_sync::SyncError;

/// Error types for scrape operations
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Invalid or missing configuration, raised before any browser starts
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A page could not be navigated to
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// An operation exceeded its deadline
    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout { operation: String, after: Duration },

    /// The image classifier backend failed; the run falls back to keywords
    #[error("Image filter backend error: {0}")]
    FilterBackend(#[from] ClassifierError),

    /// Mirroring the output tree failed
    #[error("Remote sync error: {0}")]
    RemoteSync(#[from] SyncError),

    /// The browser could not be launched or a page operation failed
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was interrupted
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrapeError {
    pub fn navigation(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    pub fn browser(message: impl std::fmt::Display) -> Self {
        Self::Browser(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

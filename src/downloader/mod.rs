//! Image downloading
//!
//! Accepted pins are fetched concurrently under one global semaphore shared
//! by all topics. Bytes are checked by the optional image classifier while
//! still in memory and only then written atomically into the topic's
//! `images/` directory.

pub mod image_downloader;
pub mod url_rewrite;

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;

use crate::retry::is_transient_status;
use crate::utils::constants::{CHROME_USER_AGENT, DOWNLOAD_REFERER};

pub use image_downloader::ImageDownloader;
pub use url_rewrite::full_resolution_url;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("Download of {url} timed out after {}s", after.as_secs())]
    Timeout { url: String, after: Duration },

    #[error("Image at {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl DownloadError {
    /// Timeouts, connection failures, 429 and 5xx are worth one more try.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_transient_status(*status),
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::TooLarge { .. } | Self::Write { .. } => false,
        }
    }
}

/// Result of handling one pin's image.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    /// File is on disk at `path`; `reused` when it was there already
    Saved { path: PathBuf, reused: bool },
    /// Classifier score met the threshold; nothing was written
    Rejected { score: f32 },
    Failed(String),
}

/// HTTP client shared by the downloader and the HTTP classifier.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<Client> {
    use reqwest::header::{HeaderMap, HeaderValue, REFERER};

    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static(DOWNLOAD_REFERER));

    let client = Client::builder()
        .user_agent(CHROME_USER_AGENT)
        .default_headers(headers)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

//! Core configuration types for scrape runs
//!
//! `ScrapeConfig` is immutable once built. Every value in it has already
//! been range-checked by the builder, so the rest of the crate reads fields
//! without re-validating.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::CategorySelection;

/// Main configuration struct for a scrape run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub(crate) categories: CategorySelection,
    pub(crate) max_pins_per_topic: usize,

    /// Root of the output tree. Relative paths are kept as given; every
    /// metadata `local_path` is expressed relative to this directory.
    pub(crate) output_folder: PathBuf,

    pub(crate) download_images: bool,
    pub(crate) headless: bool,

    /// Page-load timeout for `goto` and navigation waits, in milliseconds
    pub(crate) page_timeout_ms: u64,

    /// Wall-clock budget for one topic's scroll loop
    pub(crate) topic_timeout_secs: u64,

    pub(crate) proxy: Option<String>,
    pub(crate) max_concurrent_topics: usize,
    pub(crate) max_concurrent_downloads: usize,
    pub(crate) download_timeout_secs: u64,

    /// Attempts per topic, counting the first one
    pub(crate) topic_retries: u32,

    /// Consecutive rounds with no new cards and an unchanged page height
    /// before a topic is considered exhausted
    pub(crate) scroll_stall_limit: u32,

    /// Randomized pauses, scroll steps and pointer motion
    pub(crate) humanize: bool,

    pub(crate) log_level: String,
    pub(crate) log_file: Option<PathBuf>,

    pub(crate) extra_blocked_keywords: Vec<String>,
    pub(crate) image_filter: ImageFilterSettings,

    /// Destination of the mirror step; `None` disables it
    pub(crate) remote_sync_destination: Option<String>,
}

/// Image classifier backend selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterBackendKind {
    #[default]
    KeywordOnly,
    Http,
    Command,
}

impl FilterBackendKind {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "keyword-only" | "keyword" | "none" => Some(Self::KeywordOnly),
            "http" => Some(Self::Http),
            "command" => Some(Self::Command),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeywordOnly => "keyword-only",
            Self::Http => "http",
            Self::Command => "command",
        }
    }
}

impl std::fmt::Display for FilterBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFilterSettings {
    pub(crate) enabled: bool,
    pub(crate) backend: FilterBackendKind,
    pub(crate) threshold: f32,
    pub(crate) endpoint: Option<String>,
    pub(crate) command: Option<Vec<String>>,
}

impl Default for ImageFilterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: FilterBackendKind::KeywordOnly,
            threshold: 0.7,
            endpoint: None,
            command: None,
        }
    }
}

impl ImageFilterSettings {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn backend(&self) -> FilterBackendKind {
        self.backend
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    #[must_use]
    pub fn command(&self) -> Option<&[String]> {
        self.command.as_deref()
    }
}

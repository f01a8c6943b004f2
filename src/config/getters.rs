//! Getter methods for `ScrapeConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::CategorySelection;

use super::types::{ImageFilterSettings, ScrapeConfig};

impl ScrapeConfig {
    #[must_use]
    pub fn categories(&self) -> &CategorySelection {
        &self.categories
    }

    #[must_use]
    pub fn max_pins_per_topic(&self) -> usize {
        self.max_pins_per_topic
    }

    #[must_use]
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    #[must_use]
    pub fn download_images(&self) -> bool {
        self.download_images
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    #[must_use]
    pub fn topic_timeout(&self) -> Duration {
        Duration::from_secs(self.topic_timeout_secs)
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    #[must_use]
    pub fn max_concurrent_topics(&self) -> usize {
        self.max_concurrent_topics
    }

    #[must_use]
    pub fn max_concurrent_downloads(&self) -> usize {
        self.max_concurrent_downloads
    }

    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    #[must_use]
    pub fn topic_retries(&self) -> u32 {
        self.topic_retries
    }

    #[must_use]
    pub fn scroll_stall_limit(&self) -> u32 {
        self.scroll_stall_limit
    }

    #[must_use]
    pub fn humanize(&self) -> bool {
        self.humanize
    }

    /// Lowercase tracing level name
    #[must_use]
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    #[must_use]
    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    #[must_use]
    pub fn extra_blocked_keywords(&self) -> &[String] {
        &self.extra_blocked_keywords
    }

    #[must_use]
    pub fn image_filter(&self) -> &ImageFilterSettings {
        &self.image_filter
    }

    #[must_use]
    pub fn remote_sync_destination(&self) -> Option<&str> {
        self.remote_sync_destination.as_deref()
    }
}

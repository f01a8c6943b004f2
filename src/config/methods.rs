//! Builder setters
//!
//! Setters record values only. Range and companion-key checks happen in
//! `ScrapeConfigBuilder::build`.

use std::path::PathBuf;

use crate::catalog::CategorySelection;

use super::builder::ScrapeConfigBuilder;
use super::types::FilterBackendKind;

impl ScrapeConfigBuilder {
    #[must_use]
    pub fn categories(mut self, selection: CategorySelection) -> Self {
        self.categories = selection;
        self
    }

    #[must_use]
    pub fn max_pins_per_topic(mut self, cap: usize) -> Self {
        self.max_pins_per_topic = cap;
        self
    }

    #[must_use]
    pub fn output_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_folder = dir.into();
        self
    }

    #[must_use]
    pub fn download_images(mut self, enabled: bool) -> Self {
        self.download_images = enabled;
        self
    }

    /// Run the browser without a window.
    ///
    /// Headed mode needs a display server and is meant for watching a
    /// scrape while debugging selectors.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn page_timeout_ms(mut self, ms: u64) -> Self {
        self.page_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn topic_timeout_secs(mut self, secs: u64) -> Self {
        self.topic_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn max_concurrent_topics(mut self, n: usize) -> Self {
        self.max_concurrent_topics = n;
        self
    }

    #[must_use]
    pub fn max_concurrent_downloads(mut self, n: usize) -> Self {
        self.max_concurrent_downloads = n;
        self
    }

    #[must_use]
    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.download_timeout_secs = secs;
        self
    }

    /// Attempts per topic including the first.
    #[must_use]
    pub fn topic_retries(mut self, attempts: u32) -> Self {
        self.topic_retries = attempts;
        self
    }

    #[must_use]
    pub fn scroll_stall_limit(mut self, rounds: u32) -> Self {
        self.scroll_stall_limit = rounds;
        self
    }

    /// Toggle randomized pauses and pointer motion. Tests turn this off.
    #[must_use]
    pub fn humanize(mut self, enabled: bool) -> Self {
        self.humanize = enabled;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    #[must_use]
    pub fn log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    #[must_use]
    pub fn extra_blocked_keywords(mut self, keywords: Vec<String>) -> Self {
        self.extra_blocked_keywords = keywords;
        self
    }

    #[must_use]
    pub fn image_filter_enabled(mut self, enabled: bool) -> Self {
        self.image_filter.enabled = enabled;
        self
    }

    #[must_use]
    pub fn image_filter_backend(mut self, backend: FilterBackendKind) -> Self {
        self.image_filter.backend = backend;
        self
    }

    #[must_use]
    pub fn image_filter_threshold(mut self, threshold: f32) -> Self {
        self.image_filter.threshold = threshold;
        self
    }

    #[must_use]
    pub fn image_filter_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.image_filter.endpoint = endpoint;
        self
    }

    /// Program and arguments of the command backend.
    #[must_use]
    pub fn image_filter_command(mut self, argv: Option<Vec<String>>) -> Self {
        self.image_filter.command = argv;
        self
    }

    #[must_use]
    pub fn remote_sync(mut self, enabled: bool, destination: Option<String>) -> Self {
        self.remote_sync_enabled = enabled;
        self.remote_sync_destination = destination;
        self
    }
}

//! Validating builder for `ScrapeConfig`
//!
//! Every setting has a default, so the builder can be built straight away.
//! Setters (in `methods.rs`) only record values; `build()` checks ranges,
//! companion keys and URLs in one place so the programmatic surface and the
//! environment loader reject exactly the same inputs.

use std::path::PathBuf;

use crate::catalog::CategorySelection;

use super::error::ConfigError;
use super::types::{FilterBackendKind, ImageFilterSettings, ScrapeConfig};

pub const DEFAULT_MAX_PINS_PER_TOPIC: usize = 100;
pub const DEFAULT_OUTPUT_FOLDER: &str = "pinterest_downloads";
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 45_000;
pub const DEFAULT_TOPIC_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_CONCURRENT_TOPICS: usize = 3;
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 10;
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOPIC_RETRIES: u32 = 3;
pub const DEFAULT_SCROLL_STALL_LIMIT: u32 = 5;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FILE: &str = "pinterest_scraper.log";

pub const MAX_CONCURRENT_TOPICS_LIMIT: usize = 32;
pub const MAX_CONCURRENT_DOWNLOADS_LIMIT: usize = 256;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone)]
pub struct ScrapeConfigBuilder {
    pub(crate) categories: CategorySelection,
    pub(crate) max_pins_per_topic: usize,
    pub(crate) output_folder: PathBuf,
    pub(crate) download_images: bool,
    pub(crate) headless: bool,
    pub(crate) page_timeout_ms: u64,
    pub(crate) topic_timeout_secs: u64,
    pub(crate) proxy: Option<String>,
    pub(crate) max_concurrent_topics: usize,
    pub(crate) max_concurrent_downloads: usize,
    pub(crate) download_timeout_secs: u64,
    pub(crate) topic_retries: u32,
    pub(crate) scroll_stall_limit: u32,
    pub(crate) humanize: bool,
    pub(crate) log_level: String,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) extra_blocked_keywords: Vec<String>,
    pub(crate) image_filter: ImageFilterSettings,
    pub(crate) remote_sync_enabled: bool,
    pub(crate) remote_sync_destination: Option<String>,
}

impl Default for ScrapeConfigBuilder {
    fn default() -> Self {
        Self {
            categories: CategorySelection::All,
            max_pins_per_topic: DEFAULT_MAX_PINS_PER_TOPIC,
            output_folder: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
            download_images: true,
            headless: true,
            page_timeout_ms: DEFAULT_PAGE_TIMEOUT_MS,
            topic_timeout_secs: DEFAULT_TOPIC_TIMEOUT_SECS,
            proxy: None,
            max_concurrent_topics: DEFAULT_MAX_CONCURRENT_TOPICS,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            topic_retries: DEFAULT_TOPIC_RETRIES,
            scroll_stall_limit: DEFAULT_SCROLL_STALL_LIMIT,
            humanize: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            extra_blocked_keywords: Vec::new(),
            image_filter: ImageFilterSettings::default(),
            remote_sync_enabled: false,
            remote_sync_destination: None,
        }
    }
}

impl ScrapeConfig {
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::default()
    }
}

impl ScrapeConfigBuilder {
    /// Validate every setting and produce the immutable config.
    pub fn build(self) -> Result<ScrapeConfig, ConfigError> {
        if self.max_pins_per_topic == 0 {
            return Err(ConfigError::out_of_range(
                "MAX_PINS_PER_TOPIC",
                self.max_pins_per_topic,
                1,
                usize::MAX,
            ));
        }
        check_range(
            "MAX_CONCURRENT_TOPICS",
            self.max_concurrent_topics,
            1,
            MAX_CONCURRENT_TOPICS_LIMIT,
        )?;
        check_range(
            "MAX_CONCURRENT_DOWNLOADS",
            self.max_concurrent_downloads,
            1,
            MAX_CONCURRENT_DOWNLOADS_LIMIT,
        )?;
        check_positive("TIMEOUT_MS", self.page_timeout_ms)?;
        check_positive("TOPIC_TIMEOUT_SECS", self.topic_timeout_secs)?;
        check_positive("DOWNLOAD_TIMEOUT_SECS", self.download_timeout_secs)?;
        check_positive("TOPIC_RETRIES", u64::from(self.topic_retries))?;
        check_positive("SCROLL_STALL_LIMIT", u64::from(self.scroll_stall_limit))?;

        let requested = self.log_level.trim().to_ascii_lowercase();
        let log_level = match requested.as_str() {
            "warning" => "warn",
            "critical" | "fatal" => "error",
            other if LOG_LEVELS.contains(&other) => other,
            _ => return Err(ConfigError::UnknownLogLevel(self.log_level)),
        }
        .to_string();

        let proxy = match self.proxy {
            Some(p) if !p.trim().is_empty() => {
                let p = p.trim().to_string();
                url::Url::parse(&p).map_err(|e| ConfigError::InvalidUrl {
                    key: "PROXY".to_string(),
                    value: p.clone(),
                    reason: e.to_string(),
                })?;
                Some(p)
            }
            _ => None,
        };

        let image_filter = validate_image_filter(self.image_filter)?;

        let remote_sync_destination = if self.remote_sync_enabled {
            match self.remote_sync_destination {
                Some(dest) if !dest.trim().is_empty() => Some(dest.trim().to_string()),
                _ => {
                    return Err(ConfigError::missing(
                        "REMOTE_SYNC_DESTINATION",
                        "ENABLE_REMOTE_SYNC is on",
                    ));
                }
            }
        } else {
            None
        };

        let extra_blocked_keywords = self
            .extra_blocked_keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Ok(ScrapeConfig {
            categories: self.categories,
            max_pins_per_topic: self.max_pins_per_topic,
            output_folder: self.output_folder,
            download_images: self.download_images,
            headless: self.headless,
            page_timeout_ms: self.page_timeout_ms,
            topic_timeout_secs: self.topic_timeout_secs,
            proxy,
            max_concurrent_topics: self.max_concurrent_topics,
            max_concurrent_downloads: self.max_concurrent_downloads,
            download_timeout_secs: self.download_timeout_secs,
            topic_retries: self.topic_retries,
            scroll_stall_limit: self.scroll_stall_limit,
            humanize: self.humanize,
            log_level,
            log_file: self.log_file,
            extra_blocked_keywords,
            image_filter,
            remote_sync_destination,
        })
    }
}

fn check_range(key: &str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(key, value, min, max))
    }
}

fn check_positive(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::out_of_range(key, value, 1, u64::MAX))
    } else {
        Ok(())
    }
}

fn validate_image_filter(
    settings: ImageFilterSettings,
) -> Result<ImageFilterSettings, ConfigError> {
    if !(0.0..=1.0).contains(&settings.threshold) {
        return Err(ConfigError::out_of_range(
            "IMAGE_FILTER_THRESHOLD",
            settings.threshold,
            0.0,
            1.0,
        ));
    }

    if !settings.enabled {
        return Ok(settings);
    }

    match settings.backend {
        FilterBackendKind::KeywordOnly => {}
        FilterBackendKind::Http => {
            let endpoint = settings
                .endpoint
                .as_deref()
                .filter(|e| !e.trim().is_empty())
                .ok_or_else(|| {
                    ConfigError::missing("IMAGE_FILTER_ENDPOINT", "IMAGE_FILTER_BACKEND is http")
                })?;
            url::Url::parse(endpoint.trim()).map_err(|e| ConfigError::InvalidUrl {
                key: "IMAGE_FILTER_ENDPOINT".to_string(),
                value: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        }
        FilterBackendKind::Command => {
            let has_program = settings
                .command
                .as_ref()
                .and_then(|argv| argv.first())
                .is_some_and(|program| !program.is_empty());
            if !has_program {
                return Err(ConfigError::missing(
                    "IMAGE_FILTER_COMMAND",
                    "IMAGE_FILTER_BACKEND is command",
                ));
            }
        }
    }

    Ok(settings)
}

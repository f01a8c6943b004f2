//! Environment loader for `ScrapeConfig`
//!
//! Keys are read through a lookup function so tests can feed a plain map
//! instead of mutating the process environment. Empty values count as
//! unset, which matches how `.env` files are usually written.

use std::path::PathBuf;

use crate::catalog::CategorySelection;

use super::builder::ScrapeConfigBuilder;
use super::error::ConfigError;
use super::types::{FilterBackendKind, ScrapeConfig};

impl ScrapeConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut builder = ScrapeConfigBuilder::default();

        if let Some(raw) = get("CATEGORIES") {
            builder = builder.categories(CategorySelection::parse(&raw)?);
        }
        if let Some(raw) = get("MAX_PINS_PER_TOPIC") {
            builder = builder.max_pins_per_topic(parse_number("MAX_PINS_PER_TOPIC", &raw)?);
        }
        if let Some(raw) = get("OUTPUT_FOLDER") {
            builder = builder.output_folder(PathBuf::from(raw));
        }
        if let Some(raw) = get("DOWNLOAD_IMAGES") {
            builder = builder.download_images(parse_bool("DOWNLOAD_IMAGES", &raw)?);
        }
        if let Some(raw) = get("HEADLESS") {
            builder = builder.headless(parse_bool("HEADLESS", &raw)?);
        }
        if let Some(raw) = get("TIMEOUT_MS") {
            builder = builder.page_timeout_ms(parse_number("TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = get("TOPIC_TIMEOUT_SECS") {
            builder = builder.topic_timeout_secs(parse_number("TOPIC_TIMEOUT_SECS", &raw)?);
        }
        builder = builder.proxy(get("PROXY"));
        if let Some(raw) = get("MAX_CONCURRENT_TOPICS") {
            builder = builder.max_concurrent_topics(parse_number("MAX_CONCURRENT_TOPICS", &raw)?);
        }
        if let Some(raw) = get("MAX_CONCURRENT_DOWNLOADS") {
            builder =
                builder.max_concurrent_downloads(parse_number("MAX_CONCURRENT_DOWNLOADS", &raw)?);
        }
        if let Some(raw) = get("DOWNLOAD_TIMEOUT_SECS") {
            builder = builder.download_timeout_secs(parse_number("DOWNLOAD_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = get("TOPIC_RETRIES") {
            builder = builder.topic_retries(parse_number("TOPIC_RETRIES", &raw)?);
        }
        if let Some(raw) = get("SCROLL_STALL_LIMIT") {
            builder = builder.scroll_stall_limit(parse_number("SCROLL_STALL_LIMIT", &raw)?);
        }
        if let Some(raw) = get("HUMANIZE") {
            builder = builder.humanize(parse_bool("HUMANIZE", &raw)?);
        }
        if let Some(raw) = get("LOG_LEVEL") {
            builder = builder.log_level(raw);
        }
        if let Some(raw) = get("LOG_FILE") {
            builder = builder.log_file(Some(PathBuf::from(raw)));
        }
        if let Some(raw) = get("EXTRA_BLOCKED_KEYWORDS") {
            builder = builder.extra_blocked_keywords(split_list(&raw));
        }

        if let Some(raw) = get("ENABLE_IMAGE_FILTER") {
            builder = builder.image_filter_enabled(parse_bool("ENABLE_IMAGE_FILTER", &raw)?);
        }
        if let Some(raw) = get("IMAGE_FILTER_BACKEND") {
            let backend =
                FilterBackendKind::parse(&raw).ok_or(ConfigError::UnknownBackend(raw))?;
            builder = builder.image_filter_backend(backend);
        }
        if let Some(raw) = get("IMAGE_FILTER_THRESHOLD") {
            builder =
                builder.image_filter_threshold(parse_number("IMAGE_FILTER_THRESHOLD", &raw)?);
        }
        builder = builder.image_filter_endpoint(get("IMAGE_FILTER_ENDPOINT"));
        builder = builder.image_filter_command(get("IMAGE_FILTER_COMMAND").map(|raw| {
            raw.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        }));

        let sync_enabled = match get("ENABLE_REMOTE_SYNC") {
            Some(raw) => parse_bool("ENABLE_REMOTE_SYNC", &raw)?,
            None => false,
        };
        builder = builder.remote_sync(sync_enabled, get("REMOTE_SYNC_DESTINATION"));

        builder.build()
    }
}

/// Accepts `true/false/1/0/yes/no/on/off`, case-insensitive.
pub fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings() {
        for yes in ["true", "TRUE", "1", "yes", "On"] {
            assert!(parse_bool("K", yes).unwrap());
        }
        for no in ["false", "0", "NO", "off"] {
            assert!(!parse_bool("K", no).unwrap());
        }
        assert!(matches!(
            parse_bool("HEADLESS", "maybe"),
            Err(ConfigError::InvalidBool { .. })
        ));
    }

    #[test]
    fn list_splitting_skips_blanks() {
        assert_eq!(split_list(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
    }
}

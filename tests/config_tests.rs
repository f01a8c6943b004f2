//! Configuration loading and validation

use std::collections::HashMap;
use std::time::Duration;

use pinscrape::catalog::CategorySelection;
use pinscrape::config::{ConfigError, FilterBackendKind, ScrapeConfig};

fn from_map(pairs: &[(&str, &str)]) -> Result<ScrapeConfig, ConfigError> {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    ScrapeConfig::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn defaults_without_any_keys() {
    let config = from_map(&[]).unwrap();

    assert_eq!(config.categories(), &CategorySelection::All);
    assert_eq!(config.max_pins_per_topic(), 100);
    assert_eq!(config.output_folder().to_str(), Some("pinterest_downloads"));
    assert!(config.download_images());
    assert!(config.headless());
    assert_eq!(config.page_timeout(), Duration::from_millis(45_000));
    assert_eq!(config.topic_timeout(), Duration::from_secs(600));
    assert_eq!(config.proxy(), None);
    assert_eq!(config.max_concurrent_topics(), 3);
    assert_eq!(config.max_concurrent_downloads(), 10);
    assert_eq!(config.download_timeout(), Duration::from_secs(30));
    assert_eq!(config.topic_retries(), 3);
    assert_eq!(config.scroll_stall_limit(), 5);
    assert!(config.humanize());
    assert_eq!(config.log_level(), "info");
    assert!(!config.image_filter().enabled());
    assert_eq!(config.image_filter().backend(), FilterBackendKind::KeywordOnly);
    assert_eq!(config.remote_sync_destination(), None);
}

#[test]
fn categories_are_normalised() {
    let config = from_map(&[("CATEGORIES", "study_academia, Food/Cooking")]).unwrap();
    assert_eq!(
        config.categories(),
        &CategorySelection::Named(vec![
            "STUDY_ACADEMIA".to_string(),
            "FOOD_COOKING".to_string()
        ])
    );
}

#[test]
fn unknown_category_is_rejected() {
    let err = from_map(&[("CATEGORIES", "STUDY_ACADEMIA,UNDERWATER_BASKETRY")]).unwrap_err();
    assert!(matches!(err, ConfigError::Category(_)), "{err}");
    assert!(err.to_string().contains("UNDERWATER_BASKETRY"));
}

#[test]
fn invalid_boolean_names_the_key() {
    let err = from_map(&[("HEADLESS", "sometimes")]).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidBool {
            key: "HEADLESS".to_string(),
            value: "sometimes".to_string()
        }
    );
}

#[test]
fn numbers_must_parse_and_fit() {
    assert!(matches!(
        from_map(&[("MAX_PINS_PER_TOPIC", "lots")]),
        Err(ConfigError::InvalidNumber { .. })
    ));
    assert!(matches!(
        from_map(&[("MAX_PINS_PER_TOPIC", "0")]),
        Err(ConfigError::OutOfRange { .. })
    ));
    assert!(matches!(
        from_map(&[("MAX_CONCURRENT_TOPICS", "33")]),
        Err(ConfigError::OutOfRange { .. })
    ));
    assert!(matches!(
        from_map(&[("MAX_CONCURRENT_DOWNLOADS", "0")]),
        Err(ConfigError::OutOfRange { .. })
    ));
    assert!(from_map(&[("MAX_CONCURRENT_DOWNLOADS", "256")]).is_ok());
}

#[test]
fn log_level_aliases_and_unknown_levels() {
    assert_eq!(from_map(&[("LOG_LEVEL", "WARNING")]).unwrap().log_level(), "warn");
    assert_eq!(from_map(&[("LOG_LEVEL", "DEBUG")]).unwrap().log_level(), "debug");
    assert!(matches!(
        from_map(&[("LOG_LEVEL", "LOUD")]),
        Err(ConfigError::UnknownLogLevel(_))
    ));
}

#[test]
fn proxy_must_be_a_url() {
    let config = from_map(&[("PROXY", "http://127.0.0.1:3128")]).unwrap();
    assert_eq!(config.proxy(), Some("http://127.0.0.1:3128"));

    assert!(matches!(
        from_map(&[("PROXY", "not a proxy")]),
        Err(ConfigError::InvalidUrl { .. })
    ));
}

#[test]
fn remote_sync_needs_a_destination() {
    let err = from_map(&[("ENABLE_REMOTE_SYNC", "yes")]).unwrap_err();
    assert!(matches!(err, ConfigError::MissingCompanion { ref key, .. } if key == "REMOTE_SYNC_DESTINATION"));

    let config = from_map(&[
        ("ENABLE_REMOTE_SYNC", "on"),
        ("REMOTE_SYNC_DESTINATION", "/mnt/backup/pins"),
    ])
    .unwrap();
    assert_eq!(config.remote_sync_destination(), Some("/mnt/backup/pins"));

    // Destination alone does nothing while sync is off
    let config = from_map(&[("REMOTE_SYNC_DESTINATION", "/mnt/backup/pins")]).unwrap();
    assert_eq!(config.remote_sync_destination(), None);
}

#[test]
fn image_filter_backends_need_their_companions() {
    assert!(matches!(
        from_map(&[("ENABLE_IMAGE_FILTER", "true"), ("IMAGE_FILTER_BACKEND", "http")]),
        Err(ConfigError::MissingCompanion { .. })
    ));
    assert!(matches!(
        from_map(&[("ENABLE_IMAGE_FILTER", "true"), ("IMAGE_FILTER_BACKEND", "command")]),
        Err(ConfigError::MissingCompanion { .. })
    ));
    assert!(matches!(
        from_map(&[("IMAGE_FILTER_BACKEND", "crystal-ball")]),
        Err(ConfigError::UnknownBackend(_))
    ));
    assert!(matches!(
        from_map(&[("IMAGE_FILTER_THRESHOLD", "1.5")]),
        Err(ConfigError::OutOfRange { .. })
    ));

    let config = from_map(&[
        ("ENABLE_IMAGE_FILTER", "1"),
        ("IMAGE_FILTER_BACKEND", "command"),
        ("IMAGE_FILTER_COMMAND", "python3  score.py --quiet"),
        ("IMAGE_FILTER_THRESHOLD", "0.5"),
    ])
    .unwrap();
    let filter = config.image_filter();
    assert_eq!(filter.backend(), FilterBackendKind::Command);
    assert_eq!(filter.threshold(), 0.5);
    assert_eq!(
        filter.command().unwrap(),
        ["python3".to_string(), "score.py".to_string(), "--quiet".to_string()]
    );
}

#[test]
fn extra_keywords_are_lowercased() {
    let config = from_map(&[("EXTRA_BLOCKED_KEYWORDS", "Gore, , Spoiler ")]).unwrap();
    assert_eq!(config.extra_blocked_keywords(), ["gore".to_string(), "spoiler".to_string()]);
}

#[test]
fn empty_values_count_as_unset() {
    let config = from_map(&[("MAX_PINS_PER_TOPIC", ""), ("PROXY", "  ")]).unwrap();
    assert_eq!(config.max_pins_per_topic(), 100);
    assert_eq!(config.proxy(), None);
}

#[test]
fn builder_applies_same_validation() {
    let err = ScrapeConfig::builder()
        .max_concurrent_topics(0)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::OutOfRange { ref key, .. } if key == "MAX_CONCURRENT_TOPICS"));

    let config = ScrapeConfig::builder()
        .max_pins_per_topic(5)
        .humanize(false)
        .build()
        .unwrap();
    assert_eq!(config.max_pins_per_topic(), 5);
    assert!(!config.humanize());
}

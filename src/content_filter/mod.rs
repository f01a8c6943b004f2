//! Content filtering
//!
//! Two stages: a keyword blocklist applied to every scraped pin before it
//! is accepted, and an optional image classifier applied to downloaded
//! bytes before they are made visible on disk.

pub mod classifier;
pub mod keyword;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::config::{FilterBackendKind, ImageFilterSettings};
use crate::error::Result;

pub use classifier::{ClassifierError, CommandClassifier, HttpClassifier, ImageClassifier};
pub use keyword::{DEFAULT_BLOCKED_KEYWORDS, KeywordFilter};

/// Outcome of running the image classifier on one download.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageVerdict {
    Keep,
    /// Score met or exceeded the threshold
    Reject(f32),
}

/// Post-download image check.
///
/// Holds no classifier when image filtering is disabled or when the run
/// is keyword-only; `evaluate` then always keeps the image.
#[derive(Clone)]
pub struct ImageFilter {
    classifier: Option<Arc<dyn ImageClassifier>>,
    threshold: f32,
}

impl std::fmt::Debug for ImageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFilter")
            .field("backend", &self.backend_name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl ImageFilter {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            classifier: None,
            threshold: 1.0,
        }
    }

    pub fn with_classifier(classifier: Arc<dyn ImageClassifier>, threshold: f32) -> Self {
        Self {
            classifier: Some(classifier),
            threshold,
        }
    }

    /// Resolve the configured backend once at startup.
    ///
    /// A backend that cannot be initialised is logged and the run continues
    /// keyword-only.
    pub fn from_settings(settings: &ImageFilterSettings, client: &Client) -> Self {
        match Self::try_from_settings(settings, client) {
            Ok(filter) => filter,
            Err(e) => {
                warn!("{e}; continuing with keyword filtering only");
                Self::disabled()
            }
        }
    }

    /// Like [`from_settings`](Self::from_settings) but reports a backend
    /// that cannot be set up.
    pub fn try_from_settings(settings: &ImageFilterSettings, client: &Client) -> Result<Self> {
        if !settings.enabled() {
            return Ok(Self::disabled());
        }

        match build_classifier(settings, client)? {
            Some(classifier) => {
                info!(
                    "Image filter enabled: backend={} threshold={}",
                    classifier.name(),
                    settings.threshold()
                );
                Ok(Self::with_classifier(classifier, settings.threshold()))
            }
            None => {
                info!("Image filter set to keyword-only");
                Ok(Self::disabled())
            }
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.classifier.is_some()
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.classifier
            .as_ref()
            .map_or("keyword-only", |c| c.name())
    }

    /// Classify downloaded bytes. A classifier error keeps the image.
    pub async fn evaluate(&self, image: &[u8], label: &str) -> ImageVerdict {
        let Some(classifier) = &self.classifier else {
            return ImageVerdict::Keep;
        };

        match classifier.classify(image).await {
            Ok(score) if score >= self.threshold => ImageVerdict::Reject(score),
            Ok(_) => ImageVerdict::Keep,
            Err(e) => {
                warn!("Image classification failed for {label}, keeping image: {e}");
                ImageVerdict::Keep
            }
        }
    }
}

fn build_classifier(
    settings: &ImageFilterSettings,
    client: &Client,
) -> Result<Option<Arc<dyn ImageClassifier>>> {
    let timeout = Duration::from_secs(30);
    match settings.backend() {
        FilterBackendKind::KeywordOnly => Ok(None),
        FilterBackendKind::Http => {
            let endpoint = settings.endpoint().ok_or_else(|| {
                ClassifierError::Unavailable("no endpoint configured".to_string())
            })?;
            Ok(Some(Arc::new(HttpClassifier::new(
                client.clone(),
                endpoint,
                timeout,
            ))))
        }
        FilterBackendKind::Command => {
            let argv = settings.command().unwrap_or_default();
            Ok(Some(Arc::new(CommandClassifier::new(argv, timeout)?)))
        }
    }
}

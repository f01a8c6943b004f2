//! Shared fixtures for the pinscrape integration tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use pinscrape::catalog::{CategorySelection, Topic};
use pinscrape::config::ScrapeConfigBuilder;
use pinscrape::content_filter::{ClassifierError, ImageClassifier};
use pinscrape::remote_sync::{RemoteSink, SyncError};
use pinscrape::scraper::{PinCollector, RawPin, StopReason, TopicScraper};
use pinscrape::{ScrapeConfig, ScrapeError};
use tokio::time::Instant;

/// Config for tests: quiet, fast, no file logging, no browser pacing.
#[allow(dead_code)]
pub fn test_config(output: &Path, categories: &[&str]) -> ScrapeConfigBuilder {
    ScrapeConfig::builder()
        .categories(CategorySelection::Named(
            categories.iter().map(|c| (*c).to_string()).collect(),
        ))
        .output_folder(output)
        .download_images(false)
        .humanize(false)
        .topic_retries(1)
        .log_file(None)
}

/// A raw card with an image URL on `host`.
#[allow(dead_code)]
pub fn raw_pin(id: &str, title: &str, host: &str) -> RawPin {
    RawPin {
        pin_id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        image_url: Some(format!("{host}/236x/{id}.jpg")),
        pin_url: None,
    }
}

#[allow(dead_code)]
pub enum Script {
    /// Offer these batches, one per round
    Batches(Vec<Vec<RawPin>>),
    /// Fail this many attempts with a transient error, then offer the batches
    FailThen(usize, Vec<Vec<RawPin>>),
    /// Offer the batches, then fail
    PartialThenFail(Vec<Vec<RawPin>>),
    /// Fail every attempt with a permanent error
    Broken,
    /// Batches per attempt; attempts past the end reuse the last entry
    PerAttempt(Vec<Vec<Vec<RawPin>>>),
}

/// Scripted `TopicScraper`, keyed by topic name.
///
/// Topics without a script stall immediately with no pins.
#[derive(Default)]
pub struct ScriptedScraper {
    scripts: Mutex<HashMap<String, Script>>,
    attempts: Mutex<HashMap<String, usize>>,
    pub calls: AtomicUsize,
    /// Pause between rounds, to make topics overlap
    pub round_pause: Duration,
}

#[allow(dead_code)]
impl ScriptedScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.round_pause = pause;
        self
    }

    pub fn script(self, topic: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(topic.to_string(), script);
        self
    }

    pub fn attempts_for(&self, topic: &str) -> usize {
        self.attempts.lock().unwrap().get(topic).copied().unwrap_or(0)
    }

    async fn offer_rounds(
        &self,
        batches: Vec<Vec<RawPin>>,
        collector: &mut PinCollector,
    ) -> StopReason {
        for batch in batches {
            if collector.is_full() {
                return StopReason::CapReached;
            }
            if !self.round_pause.is_zero() {
                tokio::time::sleep(self.round_pause).await;
            }
            collector.offer_batch(batch);
        }
        if collector.is_full() {
            StopReason::CapReached
        } else {
            StopReason::Stalled
        }
    }

    async fn run(&self, topic: &Topic, collector: &mut PinCollector) -> Result<StopReason, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(topic.name.clone()).or_default();
            *n += 1;
            *n
        };

        let batches = {
            let scripts = self.scripts.lock().unwrap();
            match scripts.get(&topic.name) {
                None => return Ok(StopReason::Stalled),
                Some(Script::Broken) => {
                    return Err(ScrapeError::browser("browser closed"));
                }
                Some(Script::FailThen(failures, _)) if attempt <= *failures => {
                    return Err(ScrapeError::timeout("page navigation", Duration::from_secs(1)));
                }
                Some(Script::PerAttempt(rounds)) => rounds
                    .get(attempt - 1)
                    .or_else(|| rounds.last())
                    .cloned()
                    .unwrap_or_default(),
                Some(Script::Batches(b) | Script::FailThen(_, b) | Script::PartialThenFail(b)) => b.clone(),
            }
        };

        let partial = matches!(
            self.scripts.lock().unwrap().get(&topic.name),
            Some(Script::PartialThenFail(_))
        );
        let reason = self.offer_rounds(batches, collector).await;
        if partial {
            return Err(ScrapeError::timeout(format!("scrape {topic}"), Duration::from_secs(1)));
        }
        Ok(reason)
    }
}

impl TopicScraper for ScriptedScraper {
    fn scrape<'a>(
        &'a self,
        topic: &'a Topic,
        collector: &'a mut PinCollector,
        _deadline: Instant,
    ) -> BoxFuture<'a, Result<StopReason, ScrapeError>> {
        Box::pin(self.run(topic, collector))
    }
}

/// Classifier returning a fixed score, or an error when `score` is `None`.
#[allow(dead_code)]
pub struct FixedClassifier {
    pub score: Option<f32>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FixedClassifier {
    pub fn scoring(score: f32) -> Self {
        Self {
            score: Some(score),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            score: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ImageClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    fn classify<'a>(&'a self, _image: &'a [u8]) -> BoxFuture<'a, Result<f32, ClassifierError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let score = self.score;
        Box::pin(async move {
            score.ok_or_else(|| ClassifierError::Unavailable("model offline".to_string()))
        })
    }
}

/// In-memory `RemoteSink` that records folders and uploads.
#[derive(Default)]
pub struct RecordingSink {
    pub folders: Mutex<Vec<(String, String)>>,
    pub uploads: Mutex<Vec<(String, String)>>,
    /// `folder/name` pairs that already exist remotely
    pub existing: Mutex<HashSet<String>>,
    /// File names whose upload fails
    pub failing: HashSet<String>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }
}

impl RemoteSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn find_or_create_folder<'a>(
        &'a self,
        parent: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<String, SyncError>> {
        Box::pin(async move {
            self.folders
                .lock()
                .unwrap()
                .push((parent.to_string(), name.to_string()));
            Ok(format!("{parent}/{name}"))
        })
    }

    fn file_exists<'a>(
        &'a self,
        folder: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<bool, SyncError>> {
        Box::pin(async move {
            Ok(self
                .existing
                .lock()
                .unwrap()
                .contains(&format!("{folder}/{name}")))
        })
    }

    fn upload_file<'a>(
        &'a self,
        folder: &'a str,
        name: &'a str,
        local_path: &'a Path,
    ) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async move {
            if self.failing.contains(name) {
                return Err(SyncError::Upload {
                    path: local_path.to_path_buf(),
                    message: "quota exceeded".to_string(),
                });
            }
            self.uploads
                .lock()
                .unwrap()
                .push((folder.to_string(), name.to_string()));
            self.existing
                .lock()
                .unwrap()
                .insert(format!("{folder}/{name}"));
            Ok(())
        })
    }
}

/// Read a JSON array of records from disk.
#[allow(dead_code)]
pub fn read_records(path: &Path) -> Vec<pinscrape::PinRecord> {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[allow(dead_code)]
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                out.extend(files_under(&path));
            } else {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

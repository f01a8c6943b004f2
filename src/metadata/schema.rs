//! Metadata records written to disk

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scraper::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Downloaded,
    Failed,
    /// Image downloading is switched off for the run
    Disabled,
}

/// One row of a `*_pins.json` / `all_pins.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinRecord {
    pub pin_id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub pin_url: String,
    pub category: String,
    pub topic: String,
    pub scraped_at: DateTime<Utc>,
    /// Relative to the output root; present only when downloaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    pub download_status: DownloadStatus,
}

impl PinRecord {
    #[must_use]
    pub fn new(pin: &Pin, download_status: DownloadStatus, local_path: Option<String>) -> Self {
        Self {
            pin_id: pin.id.clone(),
            title: pin.title.clone(),
            description: pin.description.clone(),
            image_url: pin.image_url.clone(),
            pin_url: pin.pin_url.clone(),
            category: pin.topic.category.clone(),
            topic: pin.topic.name.clone(),
            scraped_at: pin.scraped_at,
            local_path: match download_status {
                DownloadStatus::Downloaded => local_path,
                _ => None,
            },
            download_status,
        }
    }
}

/// Run-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub topics_total: usize,
    pub topics_completed: usize,
    pub topics_failed: usize,
    /// Never started because the run was interrupted
    pub topics_skipped: usize,
    pub pins_scraped: usize,
    pub pins_accepted: usize,
    pub keyword_filtered: usize,
    pub duplicates: usize,
    pub downloaded: usize,
    pub download_failed: usize,
    pub image_filtered: usize,
}

/// Per-category breakdown in the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub topics: usize,
    pub pins: usize,
    pub downloaded: usize,
}

/// Contents of `run_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub cancelled: bool,
    pub counts: RunCounts,
    pub categories: BTreeMap<String, CategoryTotals>,
    pub failed_topics: Vec<FailedTopic>,
    /// Effective configuration of the run
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTopic {
    pub category: String,
    pub topic: String,
    pub error: String,
}

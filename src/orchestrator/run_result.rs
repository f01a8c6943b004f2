//! Per-topic reports and the run-wide aggregate

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::catalog::Topic;
use crate::metadata::{CategoryTotals, FailedTopic, PinRecord, RunCounts, RunSummary};
use crate::remote_sync::SyncReport;
use crate::scraper::{CollectorStats, StopReason};

/// Outcome of one topic pipeline.
#[derive(Debug, Clone)]
pub struct TopicReport {
    pub topic: Topic,
    /// Final records, in acceptance order, classifier rejections removed
    pub records: Vec<PinRecord>,
    pub stats: CollectorStats,
    pub downloaded: usize,
    pub download_failed: usize,
    pub image_filtered: usize,
    pub attempts: u32,
    pub stop: Option<StopReason>,
    /// Last error when the topic ended without any pin
    pub error: Option<String>,
    pub metadata_path: Option<PathBuf>,
    /// Never started because the run was interrupted
    pub skipped: bool,
}

impl TopicReport {
    #[must_use]
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            records: Vec::new(),
            stats: CollectorStats::default(),
            downloaded: 0,
            download_failed: 0,
            image_filtered: 0,
            attempts: 0,
            stop: None,
            error: None,
            metadata_path: None,
            skipped: false,
        }
    }

    #[must_use]
    pub fn skipped(topic: Topic) -> Self {
        Self {
            skipped: true,
            stop: Some(StopReason::Cancelled),
            ..Self::new(topic)
        }
    }

    #[must_use]
    pub fn pin_count(&self) -> usize {
        self.records.len()
    }

    /// Pins the collector accepted, including ones the classifier removed later.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.records.len() + self.image_filtered
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.skipped && self.records.is_empty() && self.error.is_some()
    }
}

/// Everything a run produced, merged by the orchestrator loop only.
///
/// Slots are indexed by catalog position so master records keep topic
/// order no matter which topic finished first.
#[derive(Debug)]
pub struct RunResult {
    started_at: DateTime<Utc>,
    slots: Vec<Option<TopicReport>>,
    counts: RunCounts,
    categories: BTreeMap<String, CategoryTotals>,
    failed: Vec<FailedTopic>,
    finished: usize,
    cancelled: bool,
    sync: Option<SyncReport>,
}

impl RunResult {
    #[must_use]
    pub fn new(topic_count: usize) -> Self {
        Self {
            started_at: Utc::now(),
            slots: vec![None; topic_count],
            counts: RunCounts {
                topics_total: topic_count,
                ..RunCounts::default()
            },
            categories: BTreeMap::new(),
            failed: Vec::new(),
            finished: 0,
            cancelled: false,
            sync: None,
        }
    }

    /// Fold a finished topic into the totals.
    pub fn merge(&mut self, index: usize, report: TopicReport) {
        if report.skipped {
            self.counts.topics_skipped += 1;
        } else {
            self.finished += 1;

            let stats = report.stats;
            self.counts.pins_scraped += stats.scraped;
            self.counts.keyword_filtered += stats.keyword_filtered;
            self.counts.duplicates += stats.duplicates;
            self.counts.pins_accepted += report.accepted();
            self.counts.downloaded += report.downloaded;
            self.counts.download_failed += report.download_failed;
            self.counts.image_filtered += report.image_filtered;

            if report.is_failed() {
                self.counts.topics_failed += 1;
                self.failed.push(FailedTopic {
                    category: report.topic.category.clone(),
                    topic: report.topic.name.clone(),
                    error: report.error.clone().unwrap_or_default(),
                });
            } else {
                self.counts.topics_completed += 1;
            }

            let totals = self
                .categories
                .entry(report.topic.category.clone())
                .or_default();
            totals.topics += 1;
            totals.pins += report.pin_count();
            totals.downloaded += report.downloaded;
        }

        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(report);
        }
    }

    /// A topic task that died without producing a report.
    pub fn record_crash(&mut self, index: usize, topic: Topic, message: impl Into<String>) {
        let mut report = TopicReport::new(topic);
        report.error = Some(message.into());
        self.merge(index, report);
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn set_sync_report(&mut self, report: SyncReport) {
        self.sync = Some(report);
    }

    #[must_use]
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    #[must_use]
    pub fn counts(&self) -> &RunCounts {
        &self.counts
    }

    #[must_use]
    pub fn categories(&self) -> &BTreeMap<String, CategoryTotals> {
        &self.categories
    }

    #[must_use]
    pub fn failed_topics(&self) -> &[FailedTopic] {
        &self.failed
    }

    #[must_use]
    pub fn sync_report(&self) -> Option<&SyncReport> {
        self.sync.as_ref()
    }

    /// Topics that ran to completion or failure (skipped ones excluded).
    #[must_use]
    pub fn finished_topics(&self) -> usize {
        self.finished
    }

    #[must_use]
    pub fn total_topics(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn total_pins(&self) -> usize {
        self.reports().map(TopicReport::pin_count).sum()
    }

    pub fn reports(&self) -> impl Iterator<Item = &TopicReport> {
        self.slots.iter().flatten()
    }

    #[must_use]
    pub fn report_at(&self, index: usize) -> Option<&TopicReport> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn report_for(&self, topic: &Topic) -> Option<&TopicReport> {
        self.reports().find(|r| &r.topic == topic)
    }

    /// Every record in topic order, for `all_pins.json`.
    #[must_use]
    pub fn master_records(&self) -> Vec<PinRecord> {
        self.reports()
            .flat_map(|r| r.records.iter().cloned())
            .collect()
    }

    /// Categories sorted by pin count, largest first.
    #[must_use]
    pub fn category_breakdown(&self) -> Vec<(&str, CategoryTotals)> {
        let mut rows: Vec<(&str, CategoryTotals)> = self
            .categories
            .iter()
            .map(|(name, totals)| (name.as_str(), *totals))
            .collect();
        rows.sort_by(|a, b| b.1.pins.cmp(&a.1.pins).then_with(|| a.0.cmp(b.0)));
        rows
    }

    #[must_use]
    pub fn summary(&self, run_id: String, config: serde_json::Value) -> RunSummary {
        let finished_at = Utc::now();
        let duration_secs = (finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        RunSummary {
            run_id,
            started_at: self.started_at,
            finished_at,
            duration_secs,
            cancelled: self.cancelled,
            counts: self.counts,
            categories: self.categories.clone(),
            failed_topics: self.failed.clone(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DownloadStatus;
    use crate::scraper::Pin;

    fn record(topic: &Topic, id: &str) -> PinRecord {
        let pin = Pin {
            id: id.to_string(),
            title: String::new(),
            description: String::new(),
            image_url: format!("https://i.example.com/236x/{id}.jpg"),
            pin_url: format!("https://www.pinterest.com/pin/{id}/"),
            topic: topic.clone(),
            scraped_at: Utc::now(),
        };
        PinRecord::new(&pin, DownloadStatus::Disabled, None)
    }

    #[test]
    fn master_records_follow_topic_order() {
        let first = Topic::new("ART", "watercolor");
        let second = Topic::new("ART", "ink");
        let mut result = RunResult::new(2);

        let mut late = TopicReport::new(second.clone());
        late.records = vec![record(&second, "b1")];
        result.merge(1, late);

        let mut early = TopicReport::new(first.clone());
        early.records = vec![record(&first, "a1"), record(&first, "a2")];
        result.merge(0, early);

        let ids: Vec<_> = result.master_records().into_iter().map(|r| r.pin_id).collect();
        assert_eq!(ids, ["a1", "a2", "b1"]);
        assert_eq!(result.total_pins(), 3);
        assert_eq!(result.categories()["ART"].topics, 2);
    }

    #[test]
    fn failed_and_skipped_topics_are_counted_apart() {
        let mut result = RunResult::new(3);
        result.record_crash(0, Topic::new("ART", "a"), "boom");
        result.merge(1, TopicReport::skipped(Topic::new("ART", "b")));

        let counts = result.counts();
        assert_eq!(counts.topics_failed, 1);
        assert_eq!(counts.topics_skipped, 1);
        assert_eq!(counts.topics_completed, 0);
        assert_eq!(result.finished_topics(), 1);
        assert_eq!(result.failed_topics()[0].error, "boom");
    }
}

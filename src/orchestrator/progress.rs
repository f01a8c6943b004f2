//! Progress reporting for scrape runs
//!
//! The orchestrator calls a `ProgressReporter` at run and topic boundaries.
//! `LogProgress` writes the progress lines to the log stream; `NoOpProgress`
//! is for embedders and tests that report on their own.

use tracing::{info, warn};

use crate::catalog::Topic;

use super::run_result::{RunResult, TopicReport};

pub trait ProgressReporter: Send + Sync {
    /// The topic list is resolved and the first topics are about to start.
    fn report_run_started(&self, total_topics: usize, categories: &[&str]);

    fn report_topic_started(&self, topic: &Topic);

    /// A topic finished; `done` counts finished topics so far.
    fn report_topic_finished(&self, done: usize, total: usize, total_pins: usize, report: &TopicReport);

    fn report_run_finished(&self, result: &RunResult);
}

/// Progress reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_run_started(&self, _total_topics: usize, _categories: &[&str]) {}

    #[inline(always)]
    fn report_topic_started(&self, _topic: &Topic) {}

    #[inline(always)]
    fn report_topic_finished(&self, _done: usize, _total: usize, _total_pins: usize, _report: &TopicReport) {}

    #[inline(always)]
    fn report_run_finished(&self, _result: &RunResult) {}
}

/// Writes progress and the final breakdown through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

/// `Progress: 3/40 topics | Total pins: 212 | Latest: [ART] watercolor (71 pins)`
#[must_use]
pub fn progress_line(done: usize, total: usize, total_pins: usize, report: &TopicReport) -> String {
    format!(
        "Progress: {done}/{total} topics | Total pins: {total_pins} | Latest: [{}] {} ({} pins)",
        report.topic.category,
        report.topic.name,
        report.pin_count()
    )
}

impl ProgressReporter for LogProgress {
    fn report_run_started(&self, total_topics: usize, categories: &[&str]) {
        info!(
            "Scraping {total_topics} topics across {} categories: {}",
            categories.len(),
            categories.join(", ")
        );
    }

    fn report_topic_started(&self, topic: &Topic) {
        info!("Starting {topic}");
    }

    fn report_topic_finished(&self, done: usize, total: usize, total_pins: usize, report: &TopicReport) {
        if let Some(error) = &report.error
            && report.records.is_empty()
        {
            warn!("{} failed after {} attempt(s): {error}", report.topic, report.attempts);
        }
        info!("{}", progress_line(done, total, total_pins, report));
    }

    fn report_run_finished(&self, result: &RunResult) {
        let counts = result.counts();
        info!(
            "Run finished: {} pins from {}/{} topics ({} failed, {} skipped)",
            result.total_pins(),
            counts.topics_completed,
            counts.topics_total,
            counts.topics_failed,
            counts.topics_skipped
        );
        info!(
            "Filtered {} by keyword, {} duplicates, {} by image classifier; {} images downloaded, {} failed",
            counts.keyword_filtered,
            counts.duplicates,
            counts.image_filtered,
            counts.downloaded,
            counts.download_failed
        );

        info!("Pins by category:");
        for (category, totals) in result.category_breakdown() {
            info!(
                "  {category}: {} pins from {} topics ({} images)",
                totals.pins, totals.topics, totals.downloaded
            );
        }

        for failed in result.failed_topics() {
            warn!("  failed: [{}] {}: {}", failed.category, failed.topic, failed.error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_format() {
        let report = TopicReport::new(Topic::new("STUDY_ACADEMIA", "dark academia"));
        assert_eq!(
            progress_line(2, 19, 140, &report),
            "Progress: 2/19 topics | Total pins: 140 | Latest: [STUDY_ACADEMIA] dark academia (0 pins)"
        );
    }
}

//! One topic from first scrape attempt to written metadata
//!
//! Accepted pins stream from the collector into a download worker while the
//! scroll loop is still running. When scraping ends the queue closes, the
//! worker drains, and the topic's records are assembled from the download
//! outcomes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::catalog::Topic;
use crate::content_filter::KeywordFilter;
use crate::dedup::DedupIndex;
use crate::downloader::{DownloadOutcome, ImageDownloader};
use crate::error::ScrapeError;
use crate::metadata::{DownloadStatus, PinRecord, save_topic_metadata};
use crate::retry::{RetryPolicy, is_transient};
use crate::scraper::{Humanizer, Pin, PinCollector, StopReason, TopicScraper};
use crate::shutdown::ShutdownSignal;
use crate::utils::{relative_to, topic_dir};

use super::run_result::TopicReport;

/// State shared by every topic task of a run.
pub(crate) struct PipelineContext {
    pub scraper: Arc<dyn TopicScraper>,
    pub keywords: Arc<KeywordFilter>,
    pub dedup: Arc<DedupIndex>,
    /// `None` when image downloading is off
    pub downloader: Option<ImageDownloader>,
    pub shutdown: ShutdownSignal,
    pub humanizer: Humanizer,
    pub output_root: PathBuf,
    pub cap: usize,
    pub topic_timeout: Duration,
    pub topic_retry: RetryPolicy,
}

pub(crate) async fn run_topic(ctx: Arc<PipelineContext>, topic: Topic) -> TopicReport {
    let mut report = TopicReport::new(topic.clone());
    let images_dir = topic_dir(&ctx.output_root, &topic.category, &topic.name).join("images");

    let (queue, worker) = match &ctx.downloader {
        Some(downloader) => {
            let (tx, rx) = mpsc::unbounded_channel();
            let worker = spawn_download_worker(downloader.clone(), images_dir.clone(), rx);
            (Some(tx), Some(worker))
        }
        None => (None, None),
    };

    let mut collector = PinCollector::new(
        topic.clone(),
        ctx.cap,
        Arc::clone(&ctx.keywords),
        Arc::clone(&ctx.dedup),
    );
    if let Some(tx) = queue {
        collector = collector.with_download_queue(tx);
    }

    scrape_with_retries(&ctx, &topic, &mut collector, &mut report).await;

    // Dropping the collector closes the queue so the worker can drain
    let (pins, stats) = collector.finish();
    report.stats = stats;

    let mut outcomes = match worker {
        Some(handle) => handle.await.unwrap_or_else(|e| {
            error!("Download worker for {topic} crashed: {e}");
            HashMap::new()
        }),
        None => HashMap::new(),
    };

    let records = build_records(&ctx, &pins, &mut outcomes, &mut report);
    report.records = records;

    if !report.records.is_empty() {
        match save_topic_metadata(
            &ctx.output_root,
            &topic.category,
            &topic.name,
            report.records.clone(),
        )
        .await
        {
            Ok(path) => {
                debug!("Wrote {}", path.display());
                report.metadata_path = Some(path);
            }
            Err(e) => error!("Failed to save metadata for {topic}: {e:#}"),
        }
    }

    info!(
        "Finished {topic}: {} pins, {} downloaded, {} failed downloads ({})",
        report.records.len(),
        report.downloaded,
        report.download_failed,
        report
            .stop
            .map_or_else(|| "no result".to_string(), |s| s.to_string())
    );

    if !ctx.shutdown.is_triggered() {
        ctx.shutdown.sleep(ctx.humanizer.cooldown()).await;
    }

    report
}

/// Scrape attempts for one topic.
///
/// An attempt that accepted pins is kept, even when it ended in an error.
/// Attempts that ended with zero pins are retried: transient errors and
/// clean runs that stalled or ran out of time, with a linear backoff that
/// shutdown can cut short. Stats only cover the attempt that counted.
async fn scrape_with_retries(
    ctx: &PipelineContext,
    topic: &Topic,
    collector: &mut PinCollector,
    report: &mut TopicReport,
) {
    let max_attempts = ctx.topic_retry.max_attempts;

    while report.attempts < max_attempts {
        if ctx.shutdown.is_triggered() {
            report.stop = Some(StopReason::Cancelled);
            return;
        }

        report.attempts += 1;
        let attempt = report.attempts;
        let deadline = Instant::now() + ctx.topic_timeout;
        collector.reset_stats();

        match ctx.scraper.scrape(topic, collector, deadline).await {
            Ok(reason) => {
                report.stop = Some(reason);
                report.error = None;
                let empty = collector.accepted_count() == 0
                    && matches!(reason, StopReason::Stalled | StopReason::DeadlineElapsed);
                if !empty || attempt >= max_attempts {
                    return;
                }
                info!("{topic}: attempt {attempt}/{max_attempts} found no pins ({reason})");
            }
            Err(e) if collector.accepted_count() > 0 => {
                warn!(
                    "{topic}: attempt {attempt} ended early, keeping {} pins: {e}",
                    collector.accepted_count()
                );
                if matches!(e, ScrapeError::Timeout { .. }) {
                    report.stop = Some(StopReason::DeadlineElapsed);
                }
                report.error = None;
                return;
            }
            Err(e) => {
                let retryable = is_transient(&e) && attempt < max_attempts;
                warn!("{topic}: attempt {attempt}/{max_attempts} failed: {e}");
                report.stop = None;
                report.error = Some(e.to_string());
                if !retryable {
                    return;
                }
            }
        }

        let delay = ctx.topic_retry.delay_for(attempt);
        debug!("{topic}: retrying in {}s", delay.as_secs());
        if !ctx.shutdown.sleep(delay).await {
            report.stop = Some(StopReason::Cancelled);
            return;
        }
    }
}

/// Records in acceptance order. Classifier rejections are dropped.
fn build_records(
    ctx: &PipelineContext,
    pins: &[Pin],
    outcomes: &mut HashMap<String, DownloadOutcome>,
    report: &mut TopicReport,
) -> Vec<PinRecord> {
    let mut records = Vec::with_capacity(pins.len());

    for pin in pins {
        if ctx.downloader.is_none() {
            records.push(PinRecord::new(pin, DownloadStatus::Disabled, None));
            continue;
        }

        match outcomes.remove(&pin.id) {
            Some(DownloadOutcome::Saved { path, .. }) => {
                report.downloaded += 1;
                let local = relative_to(&path, &ctx.output_root);
                records.push(PinRecord::new(pin, DownloadStatus::Downloaded, Some(local)));
            }
            Some(DownloadOutcome::Rejected { score }) => {
                debug!("Dropping pin {} (classifier score {score:.2})", pin.id);
                report.image_filtered += 1;
            }
            Some(DownloadOutcome::Failed(reason)) => {
                debug!("Pin {} image failed: {reason}", pin.id);
                report.download_failed += 1;
                records.push(PinRecord::new(pin, DownloadStatus::Failed, None));
            }
            None => {
                report.download_failed += 1;
                records.push(PinRecord::new(pin, DownloadStatus::Failed, None));
            }
        }
    }

    records
}

/// Download every pin received on `queue` and collect outcomes by pin id.
///
/// Concurrency is bounded by the downloader's global semaphore, not here.
fn spawn_download_worker(
    downloader: ImageDownloader,
    images_dir: PathBuf,
    mut queue: UnboundedReceiver<Pin>,
) -> JoinHandle<HashMap<String, DownloadOutcome>> {
    tokio::spawn(async move {
        let mut in_flight: JoinSet<(String, DownloadOutcome)> = JoinSet::new();
        let mut outcomes = HashMap::new();

        loop {
            tokio::select! {
                received = queue.recv() => match received {
                    Some(pin) => {
                        let downloader = downloader.clone();
                        let dir = images_dir.clone();
                        in_flight.spawn(async move {
                            let outcome = download_pin(&downloader, &pin, &dir).await;
                            (pin.id, outcome)
                        });
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next() => collect(joined, &mut outcomes),
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            collect(joined, &mut outcomes);
        }
        outcomes
    })
}

async fn download_pin(downloader: &ImageDownloader, pin: &Pin, images_dir: &Path) -> DownloadOutcome {
    downloader.download(&pin.image_url, images_dir, &pin.id).await
}

fn collect(
    joined: Result<(String, DownloadOutcome), tokio::task::JoinError>,
    outcomes: &mut HashMap<String, DownloadOutcome>,
) {
    match joined {
        Ok((pin_id, outcome)) => {
            outcomes.insert(pin_id, outcome);
        }
        Err(e) => error!("Download task panicked: {e}"),
    }
}

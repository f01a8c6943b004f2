//! Run driver
//!
//! Resolves topics, starts one task per topic behind the topic semaphore
//! and merges reports as tasks finish. Master metadata, the run summary and
//! the optional mirror step follow once every task has returned.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::browser_setup::{BrowserOptions, launch_browser};
use crate::catalog::{self, Topic};
use crate::config::ScrapeConfig;
use crate::content_filter::{ImageFilter, KeywordFilter};
use crate::dedup::DedupIndex;
use crate::downloader::{ImageDownloader, build_http_client};
use crate::error::ScrapeError;
use crate::metadata::{save_master_metadata, save_run_summary};
use crate::remote_sync::{DirectorySink, RemoteSink, RemoteSync, SyncReport};
use crate::retry::RetryPolicy;
use crate::scraper::{ChromiumScraper, Humanizer, TopicScraper};
use crate::shutdown::ShutdownSignal;
use crate::utils::constants::TOPIC_RETRY_BACKOFF_SECS;

use super::cleanup::{CleanupResult, cleanup_browser};
use super::progress::{LogProgress, ProgressReporter};
use super::run_result::{RunResult, TopicReport};
use super::topic_pipeline::{PipelineContext, run_topic};

/// Drives a complete scrape run.
///
/// The defaults log progress, derive the image classifier from the
/// configuration and mirror into a directory when a sync destination is
/// set. Each can be replaced before calling `run`.
pub struct Orchestrator {
    config: ScrapeConfig,
    shutdown: ShutdownSignal,
    progress: Arc<dyn ProgressReporter>,
    sink: Option<Arc<dyn RemoteSink>>,
    image_filter: Option<ImageFilter>,
    http_client: Option<Client>,
    topic_backoff: Duration,
}

impl Orchestrator {
    pub fn new(config: ScrapeConfig, shutdown: ShutdownSignal) -> Self {
        Self {
            config,
            shutdown,
            progress: Arc::new(LogProgress),
            sink: None,
            image_filter: None,
            http_client: None,
            topic_backoff: Duration::from_secs(TOPIC_RETRY_BACKOFF_SECS),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Sink used by the mirror step instead of `DirectorySink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RemoteSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Image filter used instead of the configured backend.
    #[must_use]
    pub fn with_image_filter(mut self, filter: ImageFilter) -> Self {
        self.image_filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Step of the linear backoff between topic attempts.
    #[must_use]
    pub fn with_topic_backoff(mut self, step: Duration) -> Self {
        self.topic_backoff = step;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Launch the browser, scrape every selected topic and shut the browser down.
    ///
    /// Fails only when the browser cannot be launched or the output root
    /// cannot be created; topic failures are part of the result.
    pub async fn run(self) -> Result<RunResult, ScrapeError> {
        if self.shutdown.is_triggered() {
            return Err(ScrapeError::Cancelled);
        }

        let launched = launch_browser(&BrowserOptions::from_config(&self.config))
            .await
            .map_err(|e| ScrapeError::browser(format!("{e:#}")))?;

        let browser = Arc::new(launched.browser);
        let scraper: Arc<dyn TopicScraper> = Arc::new(ChromiumScraper::new(
            Arc::clone(&browser),
            &self.config,
            self.shutdown.clone(),
        ));

        let result = self.run_with_scraper(scraper).await;

        if let CleanupResult::PartialFailure(errors) =
            cleanup_browser(browser, launched.handler, launched.user_data_dir).await
        {
            warn!("Browser cleanup incomplete: {}", errors.join("; "));
        }

        result
    }

    /// Run with a caller-supplied scraper. No browser is involved.
    pub async fn run_with_scraper(
        self,
        scraper: Arc<dyn TopicScraper>,
    ) -> Result<RunResult, ScrapeError> {
        let config = self.config;
        let topics = catalog::resolve(config.categories());
        let output_root = config.output_folder().to_path_buf();

        tokio::fs::create_dir_all(&output_root).await?;

        let client = match self.http_client {
            Some(client) => client,
            None => build_http_client(config.download_timeout())?,
        };
        let image_filter = self
            .image_filter
            .unwrap_or_else(|| ImageFilter::from_settings(config.image_filter(), &client));
        if image_filter.is_active() {
            info!("Image classifier: {}", image_filter.backend_name());
        }

        let downloader = config.download_images().then(|| {
            ImageDownloader::new(
                client.clone(),
                config.max_concurrent_downloads(),
                config.download_timeout(),
                image_filter,
            )
        });

        let ctx = Arc::new(PipelineContext {
            scraper,
            keywords: Arc::new(KeywordFilter::new(config.extra_blocked_keywords())),
            dedup: Arc::new(DedupIndex::new()),
            downloader,
            shutdown: self.shutdown.clone(),
            humanizer: Humanizer::new(config.humanize()),
            output_root: output_root.clone(),
            cap: config.max_pins_per_topic(),
            topic_timeout: config.topic_timeout(),
            topic_retry: RetryPolicy::linear(config.topic_retries(), self.topic_backoff),
        });

        let progress = self.progress;
        progress.report_run_started(topics.len(), &config.categories().categories());

        let mut result = RunResult::new(topics.len());
        let slots = Arc::new(Semaphore::new(config.max_concurrent_topics()));
        let mut running = FuturesUnordered::new();

        for (index, topic) in topics.into_iter().enumerate() {
            let task = tokio::spawn(topic_task(
                Arc::clone(&ctx),
                Arc::clone(&slots),
                Arc::clone(&progress),
                topic.clone(),
            ));
            running.push(async move { (index, topic, task.await) });
        }

        while let Some((index, topic, joined)) = running.next().await {
            match joined {
                Ok(report) => {
                    let skipped = report.skipped;
                    result.merge(index, report);
                    if !skipped
                        && let Some(merged) = result.report_at(index)
                    {
                        progress.report_topic_finished(
                            result.finished_topics(),
                            result.total_topics(),
                            result.total_pins(),
                            merged,
                        );
                    }
                }
                Err(e) => {
                    error!("Task for {topic} crashed: {e}");
                    result.record_crash(index, topic, format!("task crashed: {e}"));
                }
            }
        }

        if self.shutdown.is_triggered() {
            warn!("Run interrupted; writing results for finished topics");
            result.mark_cancelled();
        }

        write_run_files(&output_root, &result, &config).await;

        if let Some(destination) = config.remote_sync_destination() {
            let sink = self.sink.unwrap_or_else(|| Arc::new(DirectorySink::new()));
            match mirror_output(&output_root, destination, sink).await {
                Ok(report) => result.set_sync_report(report),
                Err(e) => error!("{e}"),
            }
        }

        progress.report_run_finished(&result);
        Ok(result)
    }
}

/// One topic behind the topic semaphore; skipped once shutdown is signalled.
async fn topic_task(
    ctx: Arc<PipelineContext>,
    slots: Arc<Semaphore>,
    progress: Arc<dyn ProgressReporter>,
    topic: Topic,
) -> TopicReport {
    let permit = tokio::select! {
        permit = slots.acquire_owned() => permit.ok(),
        () = ctx.shutdown.cancelled() => None,
    };
    let Some(_permit) = permit else {
        return TopicReport::skipped(topic);
    };
    if ctx.shutdown.is_triggered() {
        return TopicReport::skipped(topic);
    }

    progress.report_topic_started(&topic);
    run_topic(ctx, topic).await
}

async fn write_run_files(output_root: &Path, result: &RunResult, config: &ScrapeConfig) {
    match save_master_metadata(output_root, result.master_records()).await {
        Ok(path) => info!("Wrote {} pins to {}", result.total_pins(), path.display()),
        Err(e) => error!("Failed to write master metadata: {e:#}"),
    }

    let config_json = serde_json::to_value(config).unwrap_or_else(|e| {
        warn!("Failed to serialize configuration for the run summary: {e}");
        serde_json::Value::Null
    });
    let summary = result.summary(uuid::Uuid::new_v4().to_string(), config_json);
    match save_run_summary(output_root, summary).await {
        Ok(path) => info!("Wrote run summary to {}", path.display()),
        Err(e) => error!("Failed to write run summary: {e:#}"),
    }
}

async fn mirror_output(
    output_root: &Path,
    destination: &str,
    sink: Arc<dyn RemoteSink>,
) -> Result<SyncReport, ScrapeError> {
    let report = RemoteSync::new(sink).sync_tree(output_root, destination).await?;
    info!(
        "Remote sync to {}: {} categories succeeded, {} failed",
        report.destination,
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

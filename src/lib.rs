pub mod browser_setup;
pub mod catalog;
pub mod config;
pub mod content_filter;
pub mod dedup;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod orchestrator;
pub mod remote_sync;
pub mod retry;
pub mod scraper;
pub mod shutdown;
pub mod utils;

pub use browser_setup::{BrowserOptions, download_managed_browser, find_browser_executable, launch_browser};
pub use catalog::{CategorySelection, Topic};
pub use config::{ConfigError, ScrapeConfig, ScrapeConfigBuilder};
pub use content_filter::{ImageClassifier, ImageFilter, KeywordFilter};
pub use dedup::DedupIndex;
pub use downloader::{DownloadOutcome, ImageDownloader};
pub use error::{Result, ScrapeError};
pub use metadata::{DownloadStatus, PinRecord, RunSummary};
pub use orchestrator::{LogProgress, NoOpProgress, Orchestrator, ProgressReporter, RunResult, TopicReport};
pub use remote_sync::{DirectorySink, RemoteSink, RemoteSync, SyncReport};
pub use scraper::{Pin, PinCollector, RawPin, StopReason, TopicScraper};
pub use shutdown::ShutdownSignal;

/// Scrape every configured topic with a freshly launched browser.
pub async fn scrape(config: ScrapeConfig, shutdown: ShutdownSignal) -> Result<RunResult> {
    Orchestrator::new(config, shutdown).run().await
}

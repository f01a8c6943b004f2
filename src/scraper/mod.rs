//! Topic scraping
//!
//! A `TopicScraper` fills a `PinCollector` for one topic. The production
//! implementation drives a chromium page; tests substitute scripted
//! scrapers so the orchestrator can run without a browser.

pub mod collector;
pub mod humanize;
pub mod js_scripts;
pub mod page_scraper;
pub mod types;

use futures::future::BoxFuture;
use tokio::time::Instant;

use crate::catalog::Topic;
use crate::error::ScrapeError;

pub use collector::{CollectorStats, Offer, PinCollector};
pub use humanize::Humanizer;
pub use page_scraper::ChromiumScraper;
pub use types::{Pin, RawPin, StopReason};

/// Scrapes one topic into a collector.
///
/// Pins accepted before an error stay in the collector; the caller decides
/// whether a failed attempt is retried or its partial result kept.
pub trait TopicScraper: Send + Sync {
    fn scrape<'a>(
        &'a self,
        topic: &'a Topic,
        collector: &'a mut PinCollector,
        deadline: Instant,
    ) -> BoxFuture<'a, Result<StopReason, ScrapeError>>;
}

/// Encoded search page URL for a topic.
#[must_use]
pub fn search_url(topic: &str) -> String {
    format!(
        "{}{}",
        crate::utils::SEARCH_URL_PREFIX,
        urlencoding::encode(topic.trim())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_spaces() {
        assert_eq!(
            search_url("dark academia"),
            "https://www.pinterest.com/search/pins/?q=dark%20academia"
        );
    }
}

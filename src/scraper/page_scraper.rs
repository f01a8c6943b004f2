//! Chromium-backed topic scraper
//!
//! One page per topic on the shared browser: warm up on the home page,
//! open the search view, then scroll and extract in rounds until the cap,
//! stall detection, the topic deadline or shutdown ends the loop. The page
//! is closed on every exit path.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::{Browser, Page};
use futures::future::BoxFuture;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::catalog::Topic;
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::retry::{RetryPolicy, is_transient, retry_with_backoff, with_timeout};
use crate::shutdown::ShutdownSignal;
use crate::utils::constants::{PLATFORM_HOME, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

use super::collector::PinCollector;
use super::humanize::Humanizer;
use super::js_scripts::{
    DISMISS_COOKIE_BANNER_SCRIPT, EXTRACT_PINS_SCRIPT, SCROLL_HEIGHT_SCRIPT, scroll_by_script,
};
use super::types::{RawPin, StopReason};
use super::{TopicScraper, search_url};

pub struct ChromiumScraper {
    browser: Arc<Browser>,
    page_timeout: Duration,
    topic_timeout: Duration,
    stall_limit: u32,
    humanizer: Humanizer,
    navigation_retry: RetryPolicy,
    shutdown: ShutdownSignal,
}

impl ChromiumScraper {
    pub fn new(browser: Arc<Browser>, config: &ScrapeConfig, shutdown: ShutdownSignal) -> Self {
        Self {
            browser,
            page_timeout: config.page_timeout(),
            topic_timeout: config.topic_timeout(),
            stall_limit: config.scroll_stall_limit(),
            humanizer: Humanizer::new(config.humanize()),
            navigation_retry: RetryPolicy::exponential(
                2,
                Duration::from_secs(1),
                Duration::from_millis(500),
            ),
            shutdown,
        }
    }

    async fn run(
        &self,
        topic: &Topic,
        collector: &mut PinCollector,
        deadline: Instant,
    ) -> Result<StopReason, ScrapeError> {
        let page = with_timeout(
            async {
                self.browser
                    .new_page("about:blank")
                    .await
                    .map_err(ScrapeError::browser)
            },
            self.page_timeout,
            "open page",
        )
        .await?;

        let result = self.drive(&page, topic, collector, deadline).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page for {topic}: {e}");
        }
        result
    }

    async fn drive(
        &self,
        page: &Page,
        topic: &Topic,
        collector: &mut PinCollector,
        deadline: Instant,
    ) -> Result<StopReason, ScrapeError> {
        if let Err(e) = apply_viewport(page).await {
            warn!("Failed to set viewport for {topic}: {e}");
        }

        self.navigate(page, PLATFORM_HOME).await?;
        if !self.shutdown.sleep(self.humanizer.warmup_pause()).await {
            return Ok(StopReason::Cancelled);
        }

        let url = search_url(&topic.name);
        info!("Searching {topic}: {url}");
        self.navigate(page, &url).await?;
        self.dismiss_cookie_banner(page).await;

        let mut observed: HashSet<String> = HashSet::new();
        let mut last_height = scroll_height(page).await.unwrap_or(0);
        let mut stalled_rounds = 0u32;
        let mut round = 0u32;

        loop {
            if collector.is_full() {
                return Ok(StopReason::CapReached);
            }
            if self.shutdown.is_triggered() {
                return Ok(StopReason::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::timeout(
                    format!("scrape {topic}"),
                    self.topic_timeout,
                ));
            }

            round += 1;
            if !self.scroll_round(page).await {
                return Ok(StopReason::Cancelled);
            }

            let cards = extract_cards(page).await?;
            let fresh: Vec<RawPin> = cards
                .into_iter()
                .filter(|card| !card.pin_id.is_empty() && observed.insert(card.pin_id.clone()))
                .collect();
            let new_cards = fresh.len();
            let accepted = collector.offer_batch(fresh);

            let height = scroll_height(page).await.unwrap_or(last_height);
            if new_cards == 0 && height == last_height {
                stalled_rounds += 1;
                if stalled_rounds >= self.stall_limit {
                    debug!("{topic}: no new pins after {stalled_rounds} rounds");
                    return Ok(StopReason::Stalled);
                }
            } else {
                stalled_rounds = 0;
            }
            last_height = height;

            debug!(
                "{topic}: round {round}, {new_cards} new cards, {accepted} accepted, {}/{} pins",
                collector.accepted_count(),
                collector.cap()
            );
        }
    }

    /// Navigate and wait for the load, retrying transient failures once.
    async fn navigate(&self, page: &Page, url: &str) -> Result<(), ScrapeError> {
        retry_with_backoff(&self.navigation_retry, "navigation", is_transient, move || async move {
            with_timeout(
                async {
                    page.goto(url)
                        .await
                        .map_err(|e| ScrapeError::navigation(url, e))?;
                    Ok(())
                },
                self.page_timeout,
                "page navigation",
            )
            .await?;

            with_timeout(
                async {
                    page.wait_for_navigation()
                        .await
                        .map_err(|e| ScrapeError::navigation(url, e))?;
                    Ok(())
                },
                self.page_timeout,
                "page load",
            )
            .await
        })
        .await
    }

    async fn dismiss_cookie_banner(&self, page: &Page) {
        let clicked = match page.evaluate(DISMISS_COOKIE_BANNER_SCRIPT).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                trace!("Cookie banner check failed: {e}");
                false
            }
        };
        if clicked {
            debug!("Dismissed cookie banner");
            self.shutdown.sleep(Duration::from_secs(1)).await;
        }
    }

    /// One round of scrolling, pointer motion and pause.
    ///
    /// Returns false when shutdown interrupted a pause.
    async fn scroll_round(&self, page: &Page) -> bool {
        for step in self.humanizer.scroll_plan(VIEWPORT_HEIGHT) {
            if let Err(e) = page.evaluate(scroll_by_script(step.pixels)).await {
                trace!("Scroll step failed: {e}");
            }
            if !self.shutdown.sleep(step.pause).await {
                return false;
            }
        }

        if let Some((x, y)) = self.humanizer.pointer_target(VIEWPORT_WIDTH, VIEWPORT_HEIGHT) {
            match DispatchMouseEventParams::builder()
                .r#type(DispatchMouseEventType::MouseMoved)
                .x(x)
                .y(y)
                .build()
            {
                Ok(params) => {
                    if let Err(e) = page.execute(params).await {
                        trace!("Pointer move failed: {e}");
                    }
                }
                Err(e) => trace!("Invalid pointer event: {e}"),
            }
        }

        self.shutdown.sleep(self.humanizer.round_delay()).await
    }
}

impl TopicScraper for ChromiumScraper {
    fn scrape<'a>(
        &'a self,
        topic: &'a Topic,
        collector: &'a mut PinCollector,
        deadline: Instant,
    ) -> BoxFuture<'a, Result<StopReason, ScrapeError>> {
        Box::pin(self.run(topic, collector, deadline))
    }
}

/// Desktop viewport so the result grid lays out the same way every time.
async fn apply_viewport(page: &Page) -> anyhow::Result<()> {
    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(VIEWPORT_WIDTH))
            .height(i64::from(VIEWPORT_HEIGHT))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await?;
    Ok(())
}

async fn extract_cards(page: &Page) -> Result<Vec<RawPin>, ScrapeError> {
    let result = page
        .evaluate(EXTRACT_PINS_SCRIPT)
        .await
        .map_err(|e| ScrapeError::browser(format!("pin extraction failed: {e}")))?;
    result
        .into_value::<Vec<RawPin>>()
        .map_err(|e| ScrapeError::browser(format!("unexpected pin extraction result: {e}")))
}

async fn scroll_height(page: &Page) -> Option<i64> {
    let result = page.evaluate(SCROLL_HEIGHT_SCRIPT).await.ok()?;
    result.into_value::<f64>().ok().map(|h| h as i64)
}

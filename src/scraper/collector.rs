//! Per-topic pin collector
//!
//! The collector is where a scraped card becomes an accepted pin. Each card
//! passes the keyword filter first and the process-wide dedup index second,
//! so a blocked pin never claims an id that another topic could legitimately
//! use. Accepted pins are forwarded to the download queue immediately.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::catalog::Topic;
use crate::content_filter::KeywordFilter;
use crate::dedup::DedupIndex;

use super::types::{Pin, RawPin};

/// What happened to one offered card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// Missing id or image URL
    Invalid,
    /// Title or description hit the blocklist
    Filtered,
    /// Another topic (or this one) already accepted the id
    Duplicate,
    /// The topic already holds `cap` pins; the card was not inspected
    CapReached,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorStats {
    /// Valid cards inspected
    pub scraped: usize,
    pub keyword_filtered: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

#[derive(Debug)]
pub struct PinCollector {
    topic: Topic,
    cap: usize,
    keywords: Arc<KeywordFilter>,
    dedup: Arc<DedupIndex>,
    accepted: Vec<Pin>,
    stats: CollectorStats,
    download_queue: Option<UnboundedSender<Pin>>,
}

impl PinCollector {
    pub fn new(
        topic: Topic,
        cap: usize,
        keywords: Arc<KeywordFilter>,
        dedup: Arc<DedupIndex>,
    ) -> Self {
        Self {
            topic,
            cap,
            keywords,
            dedup,
            accepted: Vec::new(),
            stats: CollectorStats::default(),
            download_queue: None,
        }
    }

    /// Forward every accepted pin to `queue` as soon as it is accepted.
    #[must_use]
    pub fn with_download_queue(mut self, queue: UnboundedSender<Pin>) -> Self {
        self.download_queue = Some(queue);
        self
    }

    pub fn offer(&mut self, raw: RawPin) -> Offer {
        if self.is_full() {
            return Offer::CapReached;
        }

        let Some(pin) = Pin::from_raw(raw, &self.topic) else {
            self.stats.invalid += 1;
            return Offer::Invalid;
        };
        self.stats.scraped += 1;

        if let Some(keyword) = self.keywords.matched_keyword(&pin.title, &pin.description) {
            trace!("Pin {} filtered by keyword '{keyword}'", pin.id);
            self.stats.keyword_filtered += 1;
            return Offer::Filtered;
        }

        if !self.dedup.accept(&pin.id) {
            self.stats.duplicates += 1;
            return Offer::Duplicate;
        }

        if let Some(queue) = &self.download_queue
            && queue.send(pin.clone()).is_err()
        {
            debug!("Download queue for {} closed; pin {} kept without download", self.topic, pin.id);
        }
        self.accepted.push(pin);
        Offer::Accepted
    }

    /// Offer a batch of cards; returns how many were accepted.
    pub fn offer_batch(&mut self, raws: impl IntoIterator<Item = RawPin>) -> usize {
        let mut accepted = 0;
        for raw in raws {
            match self.offer(raw) {
                Offer::Accepted => accepted += 1,
                Offer::CapReached => break,
                _ => {}
            }
        }
        accepted
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.accepted.len() >= self.cap
    }

    #[must_use]
    pub fn accepted(&self) -> &[Pin] {
        &self.accepted
    }

    #[must_use]
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    #[must_use]
    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Start counting afresh for a new attempt. Only valid while nothing
    /// has been accepted.
    pub fn reset_stats(&mut self) {
        debug_assert!(self.accepted.is_empty());
        self.stats = CollectorStats::default();
    }

    /// Consume the collector, closing its download queue.
    #[must_use]
    pub fn finish(self) -> (Vec<Pin>, CollectorStats) {
        (self.accepted, self.stats)
    }
}

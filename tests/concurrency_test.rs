//! Topic and download concurrency limits under load

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{Script, ScriptedScraper, raw_pin, test_config};
use futures::future::BoxFuture;
use pinscrape::catalog::{self, Topic};
use pinscrape::orchestrator::{NoOpProgress, Orchestrator};
use pinscrape::scraper::{PinCollector, StopReason, TopicScraper};
use pinscrape::{RawPin, ScrapeError, ShutdownSignal};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

/// Tracks how many calls overlap at once.
#[derive(Default)]
struct Overlap {
    active: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl Overlap {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// HTTP server that holds every request for `delay` before answering with
/// a tiny image. Returns its base URL.
async fn slow_image_server(delay: Duration, overlap: Arc<Overlap>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let overlap = Arc::clone(&overlap);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                overlap.enter();
                tokio::time::sleep(delay).await;
                overlap.leave();

                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: 3\r\nConnection: close\r\n\r\nimg",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

fn pins(prefix: &str, count: usize, host: &str) -> Vec<RawPin> {
    (1..=count)
        .map(|n| raw_pin(&format!("{prefix}{n}"), "Cozy study corner", host))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn downloads_never_exceed_the_global_limit() {
    let overlap = Arc::new(Overlap::default());
    let host = slow_image_server(Duration::from_millis(50), Arc::clone(&overlap)).await;

    let out = TempDir::new().unwrap();
    let config = test_config(out.path(), &["STUDY_ACADEMIA"])
        .download_images(true)
        .max_concurrent_topics(3)
        .max_concurrent_downloads(2)
        .build()
        .unwrap();

    let scraper = ScriptedScraper::new()
        .script("dark academia", Script::Batches(vec![pins("d", 6, &host)]))
        .script("light academia", Script::Batches(vec![pins("l", 6, &host)]))
        .script("chaotic academia", Script::Batches(vec![pins("c", 6, &host)]));

    let result = Orchestrator::new(config, ShutdownSignal::new())
        .with_progress(Arc::new(NoOpProgress))
        .run_with_scraper(Arc::new(scraper))
        .await
        .unwrap();

    assert_eq!(result.counts().downloaded, 18);
    assert_eq!(result.counts().download_failed, 0);
    assert_eq!(overlap.total(), 18);
    assert!((1..=2).contains(&overlap.peak()), "peak {}", overlap.peak());
}

/// Scraper that holds each topic briefly and records the overlap.
struct SlowScraper {
    overlap: Overlap,
    hold: Duration,
}

impl TopicScraper for SlowScraper {
    fn scrape<'a>(
        &'a self,
        _topic: &'a Topic,
        _collector: &'a mut PinCollector,
        _deadline: Instant,
    ) -> BoxFuture<'a, Result<StopReason, ScrapeError>> {
        Box::pin(async move {
            self.overlap.enter();
            tokio::time::sleep(self.hold).await;
            self.overlap.leave();
            Ok(StopReason::Stalled)
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn topics_never_exceed_the_topic_limit() {
    let out = TempDir::new().unwrap();
    let config = test_config(out.path(), &["STUDY_ACADEMIA"])
        .max_concurrent_topics(2)
        .build()
        .unwrap();
    let topic_count = catalog::topics_for("STUDY_ACADEMIA").unwrap().len();
    let scraper = Arc::new(SlowScraper {
        overlap: Overlap::default(),
        hold: Duration::from_millis(20),
    });

    let result = Orchestrator::new(config, ShutdownSignal::new())
        .with_progress(Arc::new(NoOpProgress))
        .run_with_scraper(scraper.clone())
        .await
        .unwrap();

    assert_eq!(scraper.overlap.total(), topic_count);
    assert_eq!(result.finished_topics(), topic_count);
    assert!((1..=2).contains(&scraper.overlap.peak()), "peak {}", scraper.overlap.peak());
}

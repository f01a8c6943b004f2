//! Keyword filtering, dedup and the per-topic cap

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::raw_pin;
use pinscrape::catalog::Topic;
use pinscrape::content_filter::KeywordFilter;
use pinscrape::dedup::DedupIndex;
use pinscrape::scraper::{Offer, PinCollector, RawPin};

const HOST: &str = "https://i.pinimg.com";

fn collector(topic: &Topic, cap: usize, dedup: &Arc<DedupIndex>) -> PinCollector {
    PinCollector::new(
        topic.clone(),
        cap,
        Arc::new(KeywordFilter::default()),
        Arc::clone(dedup),
    )
}

#[test]
fn dark_academia_scenario() {
    let topic = Topic::new("STUDY_ACADEMIA", "dark academia");
    let dedup = Arc::new(DedupIndex::new());
    let mut collector = collector(&topic, 5, &dedup);

    let mut blocked = raw_pin("p4", "Candlelit study", HOST);
    blocked.description = "NSFW edit".to_string();
    let candidates = vec![
        raw_pin("p1", "Oxford library at dusk", HOST),
        raw_pin("p2", "Sexy tweed outfit", HOST),
        raw_pin("p3", "Rainy reading nook", HOST),
        raw_pin("p3", "Rainy reading nook", HOST),
        blocked,
        raw_pin("p5", "Old leather books", HOST),
        raw_pin("p6", "Quill and ink", HOST),
        raw_pin("p7", "Gothic window seat", HOST),
        raw_pin("p8", "Latin notes", HOST),
        raw_pin("p9", "Study by the fire", HOST),
    ];
    assert_eq!(candidates.len(), 10);

    let offers: Vec<Offer> = candidates.into_iter().map(|c| collector.offer(c)).collect();

    assert_eq!(
        offers,
        [
            Offer::Accepted,
            Offer::Filtered,
            Offer::Accepted,
            Offer::Duplicate,
            Offer::Filtered,
            Offer::Accepted,
            Offer::Accepted,
            Offer::Accepted,
            Offer::CapReached,
            Offer::CapReached,
        ]
    );

    let (pins, stats) = collector.finish();
    let ids: Vec<&str> = pins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p1", "p3", "p5", "p6", "p7"]);
    assert_eq!(stats.keyword_filtered, 2);
    assert_eq!(stats.duplicates, 1);
    assert!(!dedup.contains("p2"), "blocked pins must not claim an id");
    assert!(!dedup.contains("p4"));
    assert!(pins.iter().all(|p| p.topic == topic));
}

#[test]
fn invalid_cards_are_counted_not_accepted() {
    let topic = Topic::new("TRAVEL", "Italian summer");
    let dedup = Arc::new(DedupIndex::new());
    let mut collector = collector(&topic, 10, &dedup);

    let no_image = RawPin {
        pin_id: "x1".to_string(),
        image_url: None,
        ..RawPin::default()
    };
    let no_id = RawPin {
        image_url: Some(format!("{HOST}/236x/a.jpg")),
        ..RawPin::default()
    };

    assert_eq!(collector.offer(no_image), Offer::Invalid);
    assert_eq!(collector.offer(no_id), Offer::Invalid);
    assert_eq!(collector.stats().invalid, 2);
    assert_eq!(collector.stats().scraped, 0);
    assert!(dedup.is_empty());
}

#[test]
fn extra_keywords_extend_the_blocklist() {
    let topic = Topic::new("FOOD_COOKING", "matcha aesthetic");
    let mut collector = PinCollector::new(
        topic,
        10,
        Arc::new(KeywordFilter::new(["Spoiler"])),
        Arc::new(DedupIndex::new()),
    );
    assert_eq!(collector.offer(raw_pin("m1", "Matcha SPOILER", HOST)), Offer::Filtered);
    assert_eq!(collector.offer(raw_pin("m2", "Matcha latte", HOST)), Offer::Accepted);
}

#[test]
fn accepted_pins_reach_the_download_queue() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut collector = collector(
        &Topic::new("COUPLE", "couple aesthetic"),
        2,
        &Arc::new(DedupIndex::new()),
    )
    .with_download_queue(tx);

    let accepted = collector.offer_batch(vec![
        raw_pin("c1", "Picnic", HOST),
        raw_pin("c2", "Sunset walk", HOST),
        raw_pin("c3", "Beach day", HOST),
    ]);
    assert_eq!(accepted, 2);
    assert!(collector.is_full());

    let (pins, _) = collector.finish();
    let mut queued = Vec::new();
    while let Ok(pin) = rx.try_recv() {
        queued.push(pin);
    }
    assert_eq!(queued, pins);
    assert!(rx.try_recv().is_err(), "queue closes when the collector finishes");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_topics_never_share_an_id() {
    let dedup = Arc::new(DedupIndex::new());
    let mut tasks = Vec::new();

    for t in 0..8 {
        let dedup = Arc::clone(&dedup);
        tasks.push(tokio::spawn(async move {
            let topic = Topic::new("ART_CULTURE", format!("topic {t}"));
            let mut collector = collector(&topic, 1_000, &dedup);
            // Every topic sees the same 200 ids, in a different order
            let mut cards: Vec<RawPin> = (0..200)
                .map(|i| raw_pin(&format!("id{}", (i * 7 + t * 13) % 200), "Gallery wall", HOST))
                .collect();
            if t % 2 == 0 {
                cards.reverse();
            }
            for card in cards {
                collector.offer(card);
                tokio::task::yield_now().await;
            }
            collector.finish()
        }));
    }

    let mut seen = HashSet::new();
    let mut total_duplicates = 0;
    for task in tasks {
        let (pins, stats) = task.await.unwrap();
        total_duplicates += stats.duplicates;
        for pin in pins {
            assert!(seen.insert(pin.id.clone()), "{} accepted twice", pin.id);
        }
    }

    assert_eq!(seen.len(), 200);
    assert_eq!(dedup.len(), 200);
    assert_eq!(total_duplicates, 8 * 200 - 200);
}

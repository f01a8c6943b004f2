//! Metadata files on disk

mod common;

use chrono::Utc;
use pinscrape::catalog::Topic;
use pinscrape::metadata::{
    DownloadStatus, PinRecord, save_master_metadata, save_topic_metadata, topic_metadata_path,
};
use pinscrape::scraper::Pin;
use tempfile::TempDir;

fn pin(id: &str, topic: &Topic) -> Pin {
    Pin {
        id: id.to_string(),
        title: "Reading nook".to_string(),
        description: "Window seat with blankets".to_string(),
        image_url: format!("https://i.pinimg.com/236x/{id}.jpg"),
        pin_url: format!("https://www.pinterest.com/pin/{id}/"),
        topic: topic.clone(),
        scraped_at: Utc::now(),
    }
}

#[test]
fn topic_metadata_path_uses_slug() {
    let root = std::path::Path::new("/out");
    let path = topic_metadata_path(root, "STUDY_ACADEMIA", "dark academia");
    assert_eq!(
        path,
        std::path::Path::new("/out/STUDY_ACADEMIA/dark_academia/dark_academia_pins.json")
    );
}

#[tokio::test]
async fn topic_file_is_a_pretty_json_array() {
    let dir = TempDir::new().unwrap();
    let topic = Topic::new("STUDY_ACADEMIA", "dark academia");
    let records = vec![
        PinRecord::new(
            &pin("1", &topic),
            DownloadStatus::Downloaded,
            Some("STUDY_ACADEMIA/dark_academia/images/1.jpg".to_string()),
        ),
        PinRecord::new(&pin("2", &topic), DownloadStatus::Failed, Some("ignored".to_string())),
    ];

    let path = save_topic_metadata(dir.path(), &topic.category, &topic.name, records.clone())
        .await
        .unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("[\n"), "expected pretty-printed array");

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["download_status"], "downloaded");
    assert_eq!(rows[0]["local_path"], "STUDY_ACADEMIA/dark_academia/images/1.jpg");
    assert_eq!(rows[0]["category"], "STUDY_ACADEMIA");
    assert_eq!(rows[0]["topic"], "dark academia");
    // Failed downloads carry no local path at all
    assert_eq!(rows[1]["download_status"], "failed");
    assert!(rows[1].get("local_path").is_none());

    assert_eq!(common::read_records(&path), records);
}

#[tokio::test]
async fn rewriting_replaces_the_whole_file() {
    let dir = TempDir::new().unwrap();
    let topic = Topic::new("COUPLE", "couple aesthetic");

    let first: Vec<PinRecord> = (0..5)
        .map(|i| PinRecord::new(&pin(&i.to_string(), &topic), DownloadStatus::Disabled, None))
        .collect();
    save_master_metadata(dir.path(), first).await.unwrap();

    let second = vec![PinRecord::new(&pin("only", &topic), DownloadStatus::Disabled, None)];
    let path = save_master_metadata(dir.path(), second).await.unwrap();

    let records = common::read_records(&path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pin_id, "only");
    // No temp files left behind next to the master file
    assert_eq!(common::files_under(dir.path()), vec![path]);
}

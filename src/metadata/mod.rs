//! Per-topic, master and summary metadata

pub mod json_saver;
pub mod schema;

pub use json_saver::{
    save_json, save_master_metadata, save_run_summary, save_topic_metadata, topic_metadata_path,
};
pub use schema::{CategoryTotals, DownloadStatus, FailedTopic, PinRecord, RunCounts, RunSummary};

//! Metadata file writers
//!
//! Serialization runs on the blocking pool under a timeout and the result
//! is written atomically, so a crash mid-write leaves the previous file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::time::timeout;

use crate::utils::constants::{MASTER_METADATA_FILE, RUN_SUMMARY_FILE, SERIALIZE_TIMEOUT_SECS};
use crate::utils::{topic_dir, topic_slug, write_atomic};

use super::schema::{PinRecord, RunSummary};

const BLOCKING_SERIALIZATION_TIMEOUT: Duration = Duration::from_secs(SERIALIZE_TIMEOUT_SECS);

/// Serialize `data` as pretty JSON and write it atomically to `path`.
pub async fn save_json<T>(data: T, path: PathBuf) -> Result<()>
where
    T: Serialize + Send + 'static,
{
    let blocking_task = tokio::task::spawn_blocking(move || serde_json::to_vec_pretty(&data));

    let json = match timeout(BLOCKING_SERIALIZATION_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => result.context("JSON serialization failed")?,
        Ok(Err(e)) => return Err(anyhow::anyhow!("JSON serialization task panicked: {e}")),
        Err(_) => {
            log::warn!(
                "JSON serialization of {} timed out after {:?}",
                path.display(),
                BLOCKING_SERIALIZATION_TIMEOUT
            );
            return Err(anyhow::anyhow!(
                "JSON serialization timed out after {BLOCKING_SERIALIZATION_TIMEOUT:?}"
            ));
        }
    };

    write_atomic(path.clone(), json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Path of a topic's `<slug>_pins.json`.
#[must_use]
pub fn topic_metadata_path(root: &Path, category: &str, topic: &str) -> PathBuf {
    topic_dir(root, category, topic).join(format!("{}_pins.json", topic_slug(topic)))
}

/// Write one topic's records. Returns the file path.
pub async fn save_topic_metadata(
    root: &Path,
    category: &str,
    topic: &str,
    records: Vec<PinRecord>,
) -> Result<PathBuf> {
    let path = topic_metadata_path(root, category, topic);
    save_json(records, path.clone()).await?;
    Ok(path)
}

/// Write `all_pins.json`. Returns the file path.
pub async fn save_master_metadata(root: &Path, records: Vec<PinRecord>) -> Result<PathBuf> {
    let path = root.join(MASTER_METADATA_FILE);
    save_json(records, path.clone()).await?;
    Ok(path)
}

/// Write `run_summary.json`. Returns the file path.
pub async fn save_run_summary(root: &Path, summary: RunSummary) -> Result<PathBuf> {
    let path = root.join(RUN_SUMMARY_FILE);
    save_json(summary, path.clone()).await?;
    Ok(path)
}

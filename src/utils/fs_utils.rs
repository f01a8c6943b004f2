//! Atomic file writes
//!
//! Content is written to a temp file in the destination directory and then
//! renamed over the target, so readers only ever see a complete file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Write `content` to `path` atomically, creating parent directories.
pub async fn write_atomic(path: PathBuf, content: Vec<u8>) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &content))
        .await
        .map_err(std::io::Error::other)?
}

fn write_atomic_blocking(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent_dir = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        )
    })?;
    std::fs::create_dir_all(parent_dir)?;

    let mut temp_file = NamedTempFile::new_in(parent_dir)?;
    temp_file.write_all(content)?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a.json");

        write_atomic(path.clone(), b"first".to_vec()).await.unwrap();
        write_atomic(path.clone(), b"second".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}

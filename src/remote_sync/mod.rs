//! Mirroring the finished output tree to a remote folder
//!
//! Sync runs once, after every local file is written. It walks the output
//! root and pushes each category through a `RemoteSink`, creating folders
//! on demand and skipping files the destination already has. Failures are
//! reported per category and never touch the local tree.

pub mod directory_sink;
pub mod mirror;

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;

pub use directory_sink::DirectorySink;
pub use mirror::{CategorySync, RemoteSync, SyncReport};

#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("Local output folder {0} does not exist")]
    MissingSource(PathBuf),

    #[error("Failed to find or create folder '{name}': {message}")]
    Folder { name: String, message: String },

    #[error("Failed to upload {path}: {message}")]
    Upload { path: PathBuf, message: String },

    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Destination storage for the mirror step.
///
/// Folder ids are opaque strings issued by the sink; the root id is the
/// configured destination.
pub trait RemoteSink: Send + Sync {
    fn name(&self) -> &str;

    /// Id of the child folder `name` under `parent`, created if missing.
    fn find_or_create_folder<'a>(
        &'a self,
        parent: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<String, SyncError>>;

    fn file_exists<'a>(
        &'a self,
        folder: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<bool, SyncError>>;

    fn upload_file<'a>(
        &'a self,
        folder: &'a str,
        name: &'a str,
        local_path: &'a Path,
    ) -> BoxFuture<'a, Result<(), SyncError>>;
}

/// Folder id from a drive-style folder URL, or the input itself.
///
/// Accepts `.../folders/<id>?...`, `...?id=<id>&...` and bare ids;
/// surrounding slashes are trimmed from bare ids.
#[must_use]
pub fn extract_folder_id(destination: &str) -> String {
    let destination = destination.trim();
    if let Some((_, rest)) = destination.rsplit_once("/folders/") {
        return rest.split('?').next().unwrap_or_default().to_string();
    }
    if let Some((_, rest)) = destination.rsplit_once("?id=") {
        return rest.split('&').next().unwrap_or_default().to_string();
    }
    if destination.starts_with('/') {
        // Absolute directory destinations keep their leading slash
        return format!("/{}", destination.trim_matches('/'));
    }
    destination.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_id_from_urls() {
        assert_eq!(
            extract_folder_id("https://drive.google.com/drive/folders/1C9WuerzHjYkV5gka6EsB1p9_1bRlAPZy"),
            "1C9WuerzHjYkV5gka6EsB1p9_1bRlAPZy"
        );
        assert_eq!(
            extract_folder_id("https://drive.google.com/drive/folders/abc123?usp=sharing"),
            "abc123"
        );
        assert_eq!(
            extract_folder_id("https://drive.google.com/open?id=xyz789&authuser=0"),
            "xyz789"
        );
        assert_eq!(extract_folder_id("plainid/"), "plainid");
        assert_eq!(extract_folder_id("/mnt/backup/pins/"), "/mnt/backup/pins");
    }
}

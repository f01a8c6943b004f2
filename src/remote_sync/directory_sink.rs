//! Sink that mirrors into a local or mounted directory
//!
//! Folder ids are directory paths. The root id is the destination path
//! itself, so a sync to `/mnt/backup/pins` produces
//! `/mnt/backup/pins/<category>/<topic>/...`.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;

use crate::utils::write_atomic;

use super::{RemoteSink, SyncError};

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySink;

impl DirectorySink {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RemoteSink for DirectorySink {
    fn name(&self) -> &str {
        "directory"
    }

    fn find_or_create_folder<'a>(
        &'a self,
        parent: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<String, SyncError>> {
        Box::pin(async move {
            let path = PathBuf::from(parent).join(name);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| SyncError::Folder {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            Ok(path.to_string_lossy().into_owned())
        })
    }

    fn file_exists<'a>(
        &'a self,
        folder: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<bool, SyncError>> {
        Box::pin(async move {
            Ok(tokio::fs::metadata(Path::new(folder).join(name))
                .await
                .is_ok_and(|m| m.is_file()))
        })
    }

    fn upload_file<'a>(
        &'a self,
        folder: &'a str,
        name: &'a str,
        local_path: &'a Path,
    ) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async move {
            let upload_err = |e: std::io::Error| SyncError::Upload {
                path: local_path.to_path_buf(),
                message: e.to_string(),
            };
            let bytes = tokio::fs::read(local_path).await.map_err(upload_err)?;
            write_atomic(Path::new(folder).join(name), bytes)
                .await
                .map_err(upload_err)
        })
    }
}

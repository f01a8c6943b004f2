//! Tree walk and upload bookkeeping

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use jwalk::WalkDir;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{RemoteSink, SyncError, extract_folder_id};

/// Upload tally for one category (or the root-level files).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySync {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CategorySync {
    /// A category succeeds when no upload failed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub destination: String,
    pub categories: BTreeMap<String, CategorySync>,
    /// Files directly under the output root (`all_pins.json`, ...)
    pub root_files: CategorySync,
}

impl SyncReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.categories.values().filter(|c| c.success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.categories.len() - self.succeeded()
    }
}

/// Mirrors a local output tree through a `RemoteSink`.
pub struct RemoteSync {
    sink: Arc<dyn RemoteSink>,
    /// `(parent id, folder name)` → folder id
    folder_cache: DashMap<(String, String), String>,
}

impl RemoteSync {
    pub fn new(sink: Arc<dyn RemoteSink>) -> Self {
        Self {
            sink,
            folder_cache: DashMap::new(),
        }
    }

    /// Mirror every category directory under `local_root` into `destination`.
    pub async fn sync_tree(
        &self,
        local_root: &Path,
        destination: &str,
    ) -> Result<SyncReport, SyncError> {
        if !local_root.is_dir() {
            return Err(SyncError::MissingSource(local_root.to_path_buf()));
        }

        let root_id = extract_folder_id(destination);
        info!("Syncing {} to {} ({})", local_root.display(), root_id, self.sink.name());

        let mut report = SyncReport {
            destination: root_id.clone(),
            ..SyncReport::default()
        };

        let (categories, root_files) = list_top_level(local_root).await?;

        for file in root_files {
            self.push_file(&file, &root_id, &mut report.root_files).await;
        }

        for category_dir in categories {
            let Some(name) = category_dir.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let tally = self.sync_category(&category_dir, &root_id, &name).await;
            info!(
                "Category '{name}' synced: {} uploaded, {} already present, {} failed",
                tally.uploaded, tally.skipped, tally.failed
            );
            report.categories.insert(name, tally);
        }

        Ok(report)
    }

    async fn sync_category(&self, category_dir: &Path, root_id: &str, name: &str) -> CategorySync {
        let mut tally = CategorySync::default();

        let category_id = match self.folder(root_id, name).await {
            Ok(id) => id,
            Err(e) => {
                warn!("{e}");
                tally.failed += 1;
                return tally;
            }
        };

        let files = match list_files(category_dir).await {
            Ok(files) => files,
            Err(e) => {
                warn!("{e}");
                tally.failed += 1;
                return tally;
            }
        };

        for file in files {
            let Ok(relative) = file.strip_prefix(category_dir) else {
                continue;
            };
            let mut folder_id = category_id.clone();
            let mut folder_ok = true;
            if let Some(parent) = relative.parent() {
                for component in parent.components() {
                    let segment = component.as_os_str().to_string_lossy();
                    match self.folder(&folder_id, &segment).await {
                        Ok(id) => folder_id = id,
                        Err(e) => {
                            warn!("{e}");
                            folder_ok = false;
                            break;
                        }
                    }
                }
            }
            if !folder_ok {
                tally.failed += 1;
                continue;
            }
            self.push_file(&file, &folder_id, &mut tally).await;
        }

        tally
    }

    async fn push_file(&self, file: &Path, folder_id: &str, tally: &mut CategorySync) {
        let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };

        match self.sink.file_exists(folder_id, &name).await {
            Ok(true) => {
                debug!("Already present remotely: {name}");
                tally.skipped += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("{e}");
                tally.failed += 1;
                return;
            }
        }

        match self.sink.upload_file(folder_id, &name, file).await {
            Ok(()) => {
                debug!("Uploaded {}", file.display());
                tally.uploaded += 1;
            }
            Err(e) => {
                warn!("{e}");
                tally.failed += 1;
            }
        }
    }

    /// Cached find-or-create.
    async fn folder(&self, parent: &str, name: &str) -> Result<String, SyncError> {
        let key = (parent.to_string(), name.to_string());
        if let Some(id) = self.folder_cache.get(&key) {
            return Ok(id.value().clone());
        }
        let id = self.sink.find_or_create_folder(parent, name).await?;
        self.folder_cache.insert(key, id.clone());
        Ok(id)
    }

    /// Number of cached folder ids.
    #[must_use]
    pub fn cached_folders(&self) -> usize {
        self.folder_cache.len()
    }
}

/// Visible category directories and root-level files, sorted by name.
async fn list_top_level(root: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), SyncError> {
    let walk_err = |e: std::io::Error| SyncError::Walk {
        path: root.to_path_buf(),
        message: e.to_string(),
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(root).await.map_err(walk_err)?;
    while let Some(entry) = entries.next_entry().await.map_err(walk_err)? {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().await.map_err(walk_err)?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    dirs.sort();
    files.sort();
    Ok((dirs, files))
}

/// Every regular file below `dir`, in sorted walk order.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let dir = dir.to_path_buf();
    let walk_root = dir.clone();
    tokio::task::spawn_blocking(move || {
        let mut files = Vec::new();
        for entry in WalkDir::new(&walk_root).sort(true).skip_hidden(true) {
            let entry = entry.map_err(|e| SyncError::Walk {
                path: walk_root.clone(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    })
    .await
    .map_err(|e| SyncError::Walk {
        path: dir,
        message: e.to_string(),
    })?
}

//! Concurrent, size-limited, atomic image downloads

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::content_filter::{ImageFilter, ImageVerdict};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::utils::constants::MAX_IMAGE_BYTES;
use crate::utils::{image_extension, write_atomic};

use super::url_rewrite::full_resolution_url;
use super::{DownloadError, DownloadOutcome};

/// Downloads pin images into topic directories.
///
/// Cheap to clone; clones share the client and the global download
/// semaphore.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: Client,
    permits: Arc<Semaphore>,
    timeout: Duration,
    max_bytes: usize,
    retry: RetryPolicy,
    image_filter: ImageFilter,
}

impl ImageDownloader {
    pub fn new(
        client: Client,
        max_concurrent: usize,
        timeout: Duration,
        image_filter: ImageFilter,
    ) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
            max_bytes: MAX_IMAGE_BYTES,
            // One retry on transient failures
            retry: RetryPolicy::exponential(2, Duration::from_millis(500), Duration::from_millis(500)),
            image_filter,
        }
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Destination of a pin's image inside `images_dir`.
    #[must_use]
    pub fn destination(images_dir: &Path, pin_id: &str, image_url: &str) -> PathBuf {
        let url = full_resolution_url(image_url);
        images_dir.join(format!("{pin_id}.{}", image_extension(&url)))
    }

    /// Fetch, classify and persist one pin image.
    ///
    /// Never returns an error: every failure becomes `DownloadOutcome::Failed`
    /// and leaves nothing at the destination path.
    pub async fn download(&self, image_url: &str, images_dir: &Path, pin_id: &str) -> DownloadOutcome {
        let url = full_resolution_url(image_url);
        let dest = Self::destination(images_dir, pin_id, image_url);

        if let Ok(meta) = tokio::fs::metadata(&dest).await
            && meta.is_file()
            && meta.len() > 0
        {
            debug!("Reusing existing image {}", dest.display());
            return DownloadOutcome::Saved {
                path: dest,
                reused: true,
            };
        }

        let bytes = {
            // Permit covers the network fetch only
            let _permit = match self.permits.acquire().await {
                Ok(p) => p,
                Err(_) => return DownloadOutcome::Failed("download pool closed".to_string()),
            };
            let fetched = retry_with_backoff(
                &self.retry,
                &format!("download {pin_id}"),
                DownloadError::is_transient,
                || self.fetch(&url),
            )
            .await;
            match fetched {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Image download failed for pin {pin_id}: {e}");
                    return DownloadOutcome::Failed(e.to_string());
                }
            }
        };

        if let ImageVerdict::Reject(score) = self.image_filter.evaluate(&bytes, pin_id).await {
            debug!("Image for pin {pin_id} rejected by classifier (score {score:.3})");
            return DownloadOutcome::Rejected { score };
        }

        if let Err(e) = write_atomic(dest.clone(), bytes).await {
            let err = DownloadError::Write {
                path: dest,
                message: e.to_string(),
            };
            warn!("{err}");
            return DownloadOutcome::Failed(err.to_string());
        }

        DownloadOutcome::Saved {
            path: dest,
            reused: false,
        }
    }

    /// Stream the body into memory, enforcing `max_bytes` as chunks arrive.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let to_error = |e: reqwest::Error| {
            if e.is_timeout() {
                DownloadError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                }
            } else {
                DownloadError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(to_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let expected_size = response.content_length().unwrap_or(0);
        if expected_size > self.max_bytes as u64 {
            return Err(DownloadError::TooLarge {
                url: url.to_string(),
                limit: self.max_bytes,
            });
        }

        let mut buffer = Vec::with_capacity(usize::try_from(expected_size).unwrap_or(0));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(to_error)?;
            if buffer.len() + chunk.len() > self.max_bytes {
                return Err(DownloadError::TooLarge {
                    url: url.to_string(),
                    limit: self.max_bytes,
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(buffer)
    }
}

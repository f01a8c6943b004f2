//! Browser shutdown after a run

use std::path::PathBuf;
use std::sync::Arc;

use chromiumoxide::Browser;
use log::{debug, warn};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    Success,
    /// Some steps failed; the messages say which
    PartialFailure(Vec<String>),
}

impl CleanupResult {
    fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self::Success
        } else {
            Self::PartialFailure(errors)
        }
    }
}

/// Close the shared browser, stop its handler and remove the profile directory.
///
/// Every scraper holding the browser must have been dropped; otherwise the
/// process is left to die with the last handle.
pub async fn cleanup_browser(
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
) -> CleanupResult {
    let mut errors = Vec::new();

    match Arc::try_unwrap(browser) {
        Ok(mut browser) => {
            debug!(target: "pinscrape::cleanup", "Closing browser");
            if let Err(e) = browser.close().await {
                warn!(target: "pinscrape::cleanup", "Failed to close browser: {e}");
                errors.push(format!("Browser close failed: {e}"));
            }
            if let Err(e) = browser.wait().await {
                warn!(target: "pinscrape::cleanup", "Failed to wait for browser exit: {e}");
                errors.push(format!("Browser wait failed: {e}"));
            }
        }
        Err(_) => {
            warn!(target: "pinscrape::cleanup", "Browser still shared at shutdown, skipping close");
            errors.push("Browser still in use".to_string());
        }
    }

    handler.abort();

    if let Err(e) = tokio::fs::remove_dir_all(&user_data_dir).await {
        warn!(
            target: "pinscrape::cleanup",
            "Failed to remove browser profile {}: {e}",
            user_data_dir.display()
        );
        errors.push(format!("Profile cleanup failed: {e}"));
    } else {
        debug!(target: "pinscrape::cleanup", "Removed browser profile {}", user_data_dir.display());
    }

    CleanupResult::from_errors(errors)
}

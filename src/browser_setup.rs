//! Locating, fetching and launching the chromium engine
//!
//! A local Chrome/Chromium install is preferred (`CHROMIUM_PATH` first,
//! then well-known install locations, then `PATH`). When none is found a managed
//! build is fetched into the user cache directory. Failing both is fatal
//! for the run.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::config::ScrapeConfig;
use crate::utils::constants::{CHROME_USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

/// Browser launch settings derived from the run configuration.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub proxy: Option<String>,
    pub request_timeout: Duration,
    /// Profile directory; a per-process temp dir when `None`
    pub user_data_dir: Option<PathBuf>,
}

impl BrowserOptions {
    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            headless: config.headless(),
            proxy: config.proxy().map(str::to_string),
            request_timeout: config.page_timeout(),
            user_data_dir: None,
        }
    }

    /// Command-line flags passed to the engine on top of the builder settings.
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--user-agent={CHROME_USER_AGENT}"),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-infobars".to_string(),
            "--disable-notifications".to_string(),
            "--disable-extensions".to_string(),
            "--disable-popup-blocking".to_string(),
            "--disable-background-timer-throttling".to_string(),
            "--disable-backgrounding-occluded-windows".to_string(),
            "--disable-breakpad".to_string(),
            "--disable-features=TranslateUI".to_string(),
            "--disable-hang-monitor".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--no-sandbox".to_string(),
            "--password-store=basic".to_string(),
            "--use-mock-keychain".to_string(),
            "--mute-audio".to_string(),
        ];
        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy-server={proxy}"));
        }
        args
    }
}

/// A running browser with its CDP handler task and profile directory.
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
    pub user_data_dir: PathBuf,
}

#[cfg(target_os = "windows")]
const INSTALL_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files\Chromium\Application\chrome.exe",
];

#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/homebrew/bin/chromium",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const INSTALL_LOCATIONS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/opt/google/chrome/chrome",
];

/// Executable names looked up on `PATH`.
const PATH_NAMES: &[&str] = &["chromium", "chromium-browser", "google-chrome", "chrome"];

/// Per-user install locations, relative to the home or local data dir.
fn user_install_locations() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if cfg!(target_os = "macos")
        && let Some(home) = dirs::home_dir()
    {
        out.push(home.join("Applications/Google Chrome.app/Contents/MacOS/Google Chrome"));
        out.push(home.join("Applications/Chromium.app/Contents/MacOS/Chromium"));
    }
    if cfg!(target_os = "windows")
        && let Some(local) = dirs::data_local_dir()
    {
        out.push(local.join(r"Google\Chrome\Application\chrome.exe"));
    }
    out
}

/// First `names` entry found in the directories of a `PATH`-style value.
fn search_path_for(path_var: &OsStr, names: &[&str]) -> Option<PathBuf> {
    let suffix = if cfg!(target_os = "windows") { ".exe" } else { "" };
    std::env::split_paths(path_var)
        .flat_map(|dir| names.iter().map(move |name| dir.join(format!("{name}{suffix}"))))
        .find(|candidate| candidate.is_file())
}

/// Find a Chrome/Chromium executable installed on this machine.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("CHROMIUM_PATH").map(PathBuf::from) {
        if path.is_file() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!("CHROMIUM_PATH points to a missing file: {}", path.display());
    }

    let known = INSTALL_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .chain(user_install_locations())
        .find(|path| path.is_file());
    if let Some(path) = known {
        info!("Found browser at {}", path.display());
        return Ok(path);
    }

    if let Some(path) = std::env::var_os("PATH").and_then(|p| search_path_for(&p, PATH_NAMES)) {
        info!("Found browser on PATH: {}", path.display());
        return Ok(path);
    }

    anyhow::bail!("no Chrome or Chromium installation found")
}

/// Fetch a managed Chromium build into the user cache directory.
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| {
            let fallback = std::env::temp_dir();
            warn!(
                "No user cache directory, fetching browser under {}",
                fallback.display()
            );
            fallback
        })
        .join("pinscrape")
        .join("chromium");

    info!("Fetching managed Chromium into {}", cache_dir.display());
    std::fs::create_dir_all(&cache_dir).context("Failed to create browser cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );
    let revision = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!("Fetched Chromium to {}", revision.folder_path.display());
    Ok(revision.executable_path)
}

/// Launch the shared browser for a run.
pub async fn launch_browser(options: &BrowserOptions) -> Result<LaunchedBrowser> {
    let executable = match find_browser_executable().await {
        Ok(path) => path,
        Err(e) => {
            warn!("{e}; falling back to a managed download");
            download_managed_browser().await?
        }
    };

    let user_data_dir = options.user_data_dir.clone().unwrap_or_else(|| {
        std::env::temp_dir().join(format!("pinscrape_chrome_{}", std::process::id()))
    });
    std::fs::create_dir_all(&user_data_dir).context("Failed to create user data directory")?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(options.request_timeout)
        .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(executable);

    builder = if options.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    for arg in options.launch_args() {
        builder = builder.arg(arg);
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    debug!("Launching browser (headless: {})", options.headless);
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let message = e.to_string();
                // chromiumoxide cannot decode every CDP event newer engines send
                if message.contains("data did not match any variant of untagged enum Message")
                    || message.contains("Failed to deserialize WS response")
                {
                    trace!("Ignored CDP decode error: {message}");
                } else {
                    error!("Browser handler error: {e:?}");
                }
            }
        }
        debug!("Browser handler task finished");
    });

    info!("Browser launched");
    Ok(LaunchedBrowser {
        browser,
        handler,
        user_data_dir,
    })
}

//! Shared constants for pinscrape
//!
//! Default values and platform endpoints used across the scraper,
//! downloader and orchestrator so that magic numbers live in one place.

/// Platform home page, visited first to warm the session up.
pub const PLATFORM_HOME: &str = "https://www.pinterest.com/";

/// Search view for a topic; the encoded topic is appended.
pub const SEARCH_URL_PREFIX: &str = "https://www.pinterest.com/search/pins/?q=";

/// Base joined with relative pin hrefs.
pub const PIN_URL_BASE: &str = "https://www.pinterest.com";

/// Referer sent with every image request.
pub const DOWNLOAD_REFERER: &str = "https://www.pinterest.com/";

/// Chrome user agent used for the browser and for image downloads
///
/// Kept in one place so the browser session and the HTTP client look like
/// the same client to the platform.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Viewport applied to every topic page.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// Upper bound for a single image body: 50 MiB
///
/// Originals on the platform are rarely above a few megabytes; anything
/// larger is treated as a failed download.
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// Seconds multiplied by the attempt number between topic retries.
pub const TOPIC_RETRY_BACKOFF_SECS: u64 = 5;

/// Timeout applied to serializing metadata on the blocking pool.
pub const SERIALIZE_TIMEOUT_SECS: u64 = 30;

/// File names written at the output root.
pub const MASTER_METADATA_FILE: &str = "all_pins.json";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Image extensions kept from the source URL; anything else becomes `jpg`.
pub const KNOWN_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

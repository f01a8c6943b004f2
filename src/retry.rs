//! Timeouts, retry policies and error classification
//!
//! Navigation, topic attempts and image downloads all go through these
//! helpers so that "is this worth another try" is decided in one place.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ScrapeError;

/// Run `operation` with a deadline, mapping expiry to `ScrapeError::Timeout`.
pub async fn with_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> Result<T, ScrapeError>
where
    F: Future<Output = Result<T, ScrapeError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::timeout(operation_name, timeout)),
    }
}

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `attempt × step`
    Linear(Duration),
    /// `base × 2^(attempt-1)` plus up to `jitter` of random noise
    Exponential { base: Duration, jitter: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    #[must_use]
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Linear(step),
        }
    }

    #[must_use]
    pub fn exponential(max_attempts: u32, base: Duration, jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { base, jitter },
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Exponential { base, jitter } => {
                let exp = base.saturating_mul(2u32.saturating_pow(attempt - 1));
                let jitter_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
                let noise = if jitter_ms == 0 {
                    0
                } else {
                    rand::rng().random_range(0..jitter_ms)
                };
                exp.saturating_add(Duration::from_millis(noise))
            }
        }
    }
}

/// Retry `f` while `is_retryable` says the error is transient.
///
/// Non-retryable errors fail fast. The last error is returned once
/// `policy.max_attempts` is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: P,
    f: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable(&e) {
                    return Err(e);
                }
                if attempt >= policy.max_attempts {
                    warn!(
                        "{operation_name}: giving up after {attempt} attempt(s): {e}"
                    );
                    return Err(e);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    "{operation_name}: attempt {}/{} failed, retrying in {}ms: {e}",
                    attempt,
                    policy.max_attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Whether an error is worth retrying.
///
/// Timeouts and network-level failures are transient. A closed browser,
/// a bad configuration or a cancelled run never are.
#[must_use]
pub fn is_transient(error: &ScrapeError) -> bool {
    match error {
        ScrapeError::Timeout { .. } => true,
        ScrapeError::Navigation { message, .. } => is_transient_message(message),
        ScrapeError::Browser(message) => is_transient_message(message),
        ScrapeError::Other(e) => is_transient_message(&e.to_string()),
        ScrapeError::Configuration(_)
        | ScrapeError::FilterBackend(_)
        | ScrapeError::RemoteSync(_)
        | ScrapeError::Io(_)
        | ScrapeError::Cancelled => false,
    }
}

/// Classify a browser or network error message.
#[must_use]
pub fn is_transient_message(message: &str) -> bool {
    let msg = message.to_lowercase();

    // Browser or page state is gone; another attempt on it cannot succeed
    if msg.contains("browser closed")
        || msg.contains("browser disconnected")
        || msg.contains("page closed")
        || msg.contains("target closed")
        || msg.contains("session not found")
        || msg.contains("session closed")
        || msg.contains("no response from the chromium instance")
        || msg.contains("websocket")
        || msg.contains("captcha")
    {
        return false;
    }

    // Anything else, timeouts included, gets another try
    true
}

/// HTTP statuses worth retrying: 429 and 5xx.
#[must_use]
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_backoff_scales_with_attempt() {
        let policy = RetryPolicy::linear(3, Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
    }

    #[test]
    fn closed_browser_is_permanent() {
        assert!(!is_transient_message("Browser closed unexpectedly"));
        assert!(is_transient_message("net::ERR_CONNECTION_RESET"));
        assert!(is_transient_message("unexpected frame"));
        assert!(!is_transient_message("Blocked by captcha challenge"));
        assert!(is_transient_status(503));
        assert!(!is_transient_status(404));
    }
}

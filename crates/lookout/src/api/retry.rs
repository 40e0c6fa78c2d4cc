//! Retry policy for model-runtime calls.
//!
//! Local runtimes drop connections while models load and return 5xx while
//! swapping weights, so the client retries transient failures with
//! exponential backoff. Permanent errors (bad request, auth) fail
//! immediately. Search and fetch providers are *not* retried: a failed
//! page is skipped and a failed search degrades the turn, per the
//! pipeline's failure semantics.

use std::time::Duration;

/// Retry policy for one logical generation call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (0 = fail on the first error).
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt.
    pub initial_delay: Duration,
    /// Ceiling on the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Create a config with the given number of retries. Uses sensible defaults.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// Backoff delay for a given attempt number (0-indexed), doubling per
    /// attempt and capped at `max_delay`, with deterministic jitter keyed
    /// on the attempt number (avoids pulling in rand just for this).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jitter_factor = match attempt % 4 {
            0 => 0.75,
            1 => 0.90,
            2 => 0.60,
            _ => 0.85,
        };
        Duration::from_secs_f64(capped * jitter_factor)
    }

    /// Whether `error` should be retried at this attempt count.
    pub fn should_retry(&self, error: &str, attempt: u32) -> bool {
        attempt < self.max_retries && is_transient_error(error) && !is_permanent_error(error)
    }
}

/// Whether an error string indicates a transient (retryable) failure.
pub fn is_transient_error(error: &str) -> bool {
    if ["408", "429", "500", "502", "503", "504"]
        .iter()
        .any(|s| error.contains(&format!("HTTP {s}")))
    {
        return true;
    }

    let lower = error.to_lowercase();
    [
        "request failed:",
        "connection reset",
        "connection refused",
        "timed out",
        "timeout",
        "broken pipe",
    ]
    .iter()
    .any(|p| lower.contains(p))
}

/// Whether an error is a permanent (non-retryable) failure.
pub fn is_permanent_error(error: &str) -> bool {
    ["HTTP 400", "HTTP 401", "HTTP 403", "HTTP 404", "HTTP 422"]
        .iter()
        .any(|p| error.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_no_retries() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 0);
        assert!(!config.should_retry("request failed: timed out", 0));
    }

    #[test]
    fn delay_grows_and_caps() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(2),
            ..RetryConfig::with_retries(10)
        };
        assert!(config.delay_for_attempt(1) > config.delay_for_attempt(0));
        assert!(config.delay_for_attempt(10) <= Duration::from_secs(2));
    }

    #[test]
    fn transient_errors_are_retried() {
        let config = RetryConfig::with_retries(2);
        assert!(config.should_retry("model runtime HTTP 503: loading", 0));
        assert!(config.should_retry("request failed: connection refused", 1));
        assert!(!config.should_retry("request failed: connection refused", 2));
    }

    #[test]
    fn permanent_errors_fail_immediately() {
        let config = RetryConfig::with_retries(3);
        assert!(!config.should_retry("model runtime HTTP 400: bad request", 0));
        assert!(!config.should_retry("model runtime HTTP 401: unauthorized", 0));
        assert!(!config.should_retry("no choices in response", 0));
    }

    #[test]
    fn classifier_spot_checks() {
        assert!(is_transient_error("model runtime HTTP 429: rate limited"));
        assert!(is_transient_error("request failed: timed out"));
        assert!(!is_transient_error("failed to parse response"));
        assert!(is_permanent_error("model runtime HTTP 404: no such model"));
    }
}

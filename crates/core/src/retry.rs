//! Bounded retry for store calls
//!
//! Only transient failures are retried; domain errors pass straight through.

use std::thread;
use std::time::Duration;

use tracing::{error, warn};

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Backoff before the given retry (1-based), doubling up to the cap
pub fn backoff_for(config: &RetryConfig, retry: u32) -> Duration {
    let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
    let ms = config
        .initial_backoff_ms
        .saturating_mul(factor)
        .min(config.max_backoff_ms);
    Duration::from_millis(ms)
}

/// Run a store operation, retrying transient failures
///
/// When attempts run out the last failure is surfaced as
/// [`Error::StoreUnavailable`].
pub fn with_retry<T>(
    config: &RetryConfig,
    operation: &'static str,
    mut f: impl FnMut() -> Result<T>,
) -> Result<T> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = backoff_for(config, attempt);
                warn!(operation, attempt, error = %e, delay_ms = delay.as_millis() as u64, "Store call failed, retrying");
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) if e.is_transient() => {
                error!(operation, attempts = attempt, error = %e, "Store call failed, giving up");
                return Err(Error::StoreUnavailable(format!(
                    "{} failed after {} attempts: {}",
                    operation, attempt, e
                )));
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_backoff_ms: 20,
            max_backoff_ms: 100,
        };
        assert_eq!(backoff_for(&config, 1), Duration::from_millis(20));
        assert_eq!(backoff_for(&config, 2), Duration::from_millis(40));
        assert_eq!(backoff_for(&config, 3), Duration::from_millis(80));
        assert_eq!(backoff_for(&config, 4), Duration::from_millis(100));
        assert_eq!(backoff_for(&config, 90), Duration::from_millis(100));
    }

    #[test]
    fn test_transient_failure_recovers() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(), "flaky", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(Error::StoreUnavailable("timeout".into()))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhausted_retries_surface_store_unavailable() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(), "down", || {
            calls.set(calls.get() + 1);
            Err(Error::StoreUnavailable("connection refused".into()))
        });
        assert!(matches!(result, Err(Error::StoreUnavailable(msg)) if msg.contains("after 3 attempts")));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_domain_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(), "bad", || {
            calls.set(calls.get() + 1);
            Err(Error::InvalidInput("nope".into()))
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(calls.get(), 1);
    }
}

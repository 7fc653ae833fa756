//! Bounded retry for resolve + probe
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If the failure is permanent (`Unresolvable`), return `Error::Resolution`
//!    immediately
//! 4. If transient and attempts remain: log WARN, back off, retry
//! 5. If transient and attempts are exhausted: return `Error::StreamUnavailable`
//!
//! **Backoff Strategy:** exponential, doubling from `initial_backoff` up to
//! `max_backoff`.
//!
//! Runs entirely outside the queue lock.

use crate::error::{Error, Result};
use crate::resolver::ResolveError;
use nearer_common::config::RetryConfig;
use std::future::Future;
use std::time::{Duration, Instant};

/// Max attempts plus backoff bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Retry immediately, without sleeping between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// Run `operation` under `policy`, mapping failures to typed errors
///
/// # Arguments
/// * `policy` - Attempt bound and backoff
/// * `track_ref` - Reference being resolved, for logging and error messages
/// * `operation` - Async closure performing one resolve + probe attempt
pub async fn retry_resolution<F, Fut, T>(
    policy: &RetryPolicy,
    track_ref: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, ResolveError>>,
{
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        track_ref,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Resolution succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(ResolveError::Unresolvable(reason)) => {
                tracing::info!(track_ref, %reason, "Track reference cannot be resolved");
                return Err(Error::Resolution {
                    track_ref: track_ref.to_string(),
                    reason,
                });
            }
            Err(ResolveError::Transient(reason)) => {
                if attempt >= policy.max_attempts {
                    tracing::error!(
                        track_ref,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        %reason,
                        "Stream still unavailable, giving up"
                    );
                    return Err(Error::StreamUnavailable {
                        track_ref: track_ref.to_string(),
                        attempts: attempt,
                        last_error: reason,
                    });
                }

                let backoff = policy.backoff_after(attempt);
                tracing::warn!(
                    track_ref,
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    %reason,
                    "Stream unavailable, will retry after backoff"
                );
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_resolution(&RetryPolicy::immediate(10), "ref", || async {
            Ok::<i32, ResolveError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_resolution(&RetryPolicy::immediate(10), "ref", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(ResolveError::Transient("503".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_unresolvable_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_resolution(&RetryPolicy::immediate(10), "bogus", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ResolveError::Unresolvable("not a video".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Resolution { ref track_ref, .. }) if track_ref == "bogus"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_report_stream_unavailable() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_resolution(&RetryPolicy::immediate(10), "flaky", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ResolveError::Transient("timeout".to_string())) }
        })
        .await;

        match result {
            Err(Error::StreamUnavailable {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 10);
                assert_eq!(last_error, "timeout");
            }
            other => panic!("Expected StreamUnavailable, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(300),
        };
        assert_eq!(policy.backoff_after(1), Duration::from_millis(50));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(100));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(200));
        assert_eq!(policy.backoff_after(4), Duration::from_millis(300));
        assert_eq!(policy.backoff_after(40), Duration::from_millis(300));
    }

    #[test]
    fn test_policy_from_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.initial_backoff, Duration::from_millis(50));
    }
}

//! The bounded retry loop.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{ActionFailure, StepError};

/// Retry knobs. The defaults are deliberate: four attempts with a flat
/// one-second pause, no backoff. UI settle time does not grow because we
/// waited longer, and a test step that has not worked after four tries is
/// broken, not slow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Run `attempt` up to `policy.max_attempts` times.
///
/// Every attempt starts from scratch (the closure re-resolves its own
/// elements), so staleness heals here rather than leaking to the caller.
/// Every failure kind gets the full budget, including wrong-element-kind
/// and unclassified faults. Exhaustion reports the final attempt's failure
/// with the attempt count spent.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    verb: &str,
    locator: &str,
    mut attempt: F,
) -> Result<T, ActionFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StepError>>,
{
    for n in 1..=policy.max_attempts {
        match attempt().await {
            Ok(value) => {
                if n > 1 {
                    debug!(verb, locator, attempt = n, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(step) if n == policy.max_attempts => {
                error!(verb, locator, kind = step.kind.name(), attempts = n, detail = %step.detail, "failed, attempts exhausted");
                return Err(ActionFailure::new(step.kind, verb, locator, n, step.detail));
            }
            Err(step) => {
                warn!(verb, locator, kind = step.kind.name(), attempt = n, detail = %step.detail, "attempt failed, retrying");
                sleep(policy.delay()).await;
            }
        }
    }
    // max_attempts >= 1, so the loop always returns
    unreachable!("retry loop exited without a verdict")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn flaky(fail_first: u32) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<u32, StepError>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let probe_calls = calls.clone();
        let attempt = move || {
            let n = probe_calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n <= fail_first {
                Err(StepError::new(FailureKind::Stale, "detached"))
            } else {
                Ok(n)
            })
        };
        (calls, attempt)
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_the_last_allowed_attempt() {
        let policy = RetryPolicy::default();
        let (calls, attempt) = flaky(3);
        let started = Instant::now();
        let value = with_retry(&policy, "click", "css:#x", attempt).await.unwrap();
        assert_eq!(value, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // three pauses of one second between the four attempts
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_attempt_count() {
        let policy = RetryPolicy::default();
        let (calls, attempt) = flaky(10);
        let failure = with_retry::<u32, _, _>(&policy, "click", "css:#x", attempt)
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(failure.attempts, 4);
        assert_eq!(failure.kind, FailureKind::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_element_kind_gets_the_full_budget() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let probe_calls = calls.clone();
        let failure = with_retry::<(), _, _>(&policy, "select", "css:#x", move || {
            probe_calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err(StepError::new(
                FailureKind::WrongElementKind,
                "no options",
            )))
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(failure.attempts, 4);
        assert_eq!(failure.kind, FailureKind::WrongElementKind);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_flat_not_backed_off() {
        let policy = RetryPolicy::default().with_attempts(3);
        let (_, attempt) = flaky(10);
        let started = Instant::now();
        let _ = with_retry::<u32, _, _>(&policy, "click", "css:#x", attempt).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }
}

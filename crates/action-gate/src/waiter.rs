//! The polling waiter.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::errors::GateError;
use crate::types::GateTimeouts;

/// Polls a probe until it yields a value or a timeout elapses.
///
/// The probe is re-run from scratch every tick; callers build it so each run
/// performs a fresh element lookup, which is what makes staleness self-heal.
/// The waiter blocks only its own task and never aborts the process.
#[derive(Clone, Debug)]
pub struct ConditionWaiter {
    timeouts: GateTimeouts,
}

impl Default for ConditionWaiter {
    fn default() -> Self {
        Self::new(GateTimeouts::default())
    }
}

impl ConditionWaiter {
    pub fn new(timeouts: GateTimeouts) -> Self {
        Self { timeouts }
    }

    pub fn timeouts(&self) -> &GateTimeouts {
        &self.timeouts
    }

    /// Default per-call wait budget.
    pub fn condition_timeout(&self) -> Duration {
        self.timeouts.condition()
    }

    /// Poll `probe` until it yields `Some(value)`.
    ///
    /// `Ok(None)` means "not yet"; a probe error is a hard fault and ends the
    /// wait immediately. Timing out yields [`GateError::Timeout`] naming the
    /// condition.
    pub async fn wait_for<T, F, Fut>(
        &self,
        condition: &str,
        timeout: Duration,
        mut probe: F,
    ) -> Result<T, GateError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, GateError>>,
    {
        let started = Instant::now();
        debug!(condition, timeout_ms = timeout.as_millis() as u64, "waiting");
        loop {
            if let Some(value) = probe().await? {
                trace!(condition, "condition met");
                return Ok(value);
            }
            if started.elapsed() >= timeout {
                return Err(GateError::Timeout {
                    condition: condition.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            sleep(self.timeouts.interval()).await;
        }
    }

    /// Poll `probe` until it confirms absence (`Ok(true)`).
    ///
    /// Short-circuits the moment the target is gone. Timing out is not a
    /// fault here: it returns `Ok(false)`, meaning "confirmed still present",
    /// which is a valid terminal answer for a dont-see check.
    pub async fn confirm_absent<F, Fut>(
        &self,
        condition: &str,
        timeout: Duration,
        mut probe: F,
    ) -> Result<bool, GateError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, GateError>>,
    {
        let started = Instant::now();
        debug!(condition, timeout_ms = timeout.as_millis() as u64, "confirming absence");
        loop {
            if probe().await? {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                debug!(condition, "still present after timeout");
                return Ok(false);
            }
            sleep(self.timeouts.interval()).await;
        }
    }
}

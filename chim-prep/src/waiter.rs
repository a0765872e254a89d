//! Retry-until-accepted polling
//!
//! **Algorithm:**
//! 1. Invoke the probe
//! 2. If it fails, return the failure immediately (no retry on error)
//! 3. If the result is accepted, return it
//! 4. Otherwise wait a fixed interval and go to 1
//!
//! There is no attempt limit and no timeout. The only way out of a result
//! that is never accepted is the cancellation token, which is checked before
//! every attempt and raced against every probe and every sleep.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fixed delay between two probes
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError<E> {
    /// The probe itself failed
    #[error("probe failed: {0}")]
    Probe(E),

    /// The owning scope was torn down
    #[error("wait cancelled")]
    Cancelled,
}

/// Polls an async probe until a predicate accepts its result
#[derive(Debug, Clone)]
pub struct PollingWaiter {
    interval: Duration,
    cancel: CancellationToken,
}

impl PollingWaiter {
    pub fn new(interval: Duration, cancel: CancellationToken) -> Self {
        Self { interval, cancel }
    }

    /// Run `probe` until `accept` returns true for its result
    ///
    /// # Arguments
    /// * `operation_name` - Name for logging (e.g., "current operation")
    /// * `probe` - Async closure fetching the current value
    /// * `accept` - Acceptance predicate
    pub async fn wait_for<T, E, F, Fut, P>(
        &self,
        operation_name: &str,
        mut probe: F,
        accept: P,
    ) -> Result<T, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
    {
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(WaitError::Cancelled);
            }
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(WaitError::Cancelled),
                result = probe() => result,
            };

            let value = result.map_err(WaitError::Probe)?;
            if accept(&value) {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Poll accepted after retry");
                }
                return Ok(value);
            }

            debug!(
                operation = operation_name,
                attempt,
                retry_in_ms = self.interval.as_millis() as u64,
                "Result not ready, will poll again"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(WaitError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

//! Polling acquisition layered on top of [`LeaseLock::try_acquire`].
//!
//! The handle itself never loops. Callers that want to wait for a lease use
//! [`acquire_with_backoff`], which keeps calling `try_acquire` with
//! exponential backoff and jitter until it wins or the timeout passes.

use std::time::Duration;

use rand::Rng;
use tokio::time::{Instant, sleep};
use tracing::{Span, field, instrument};

use crate::error::{LockError, LockResult};
use crate::lock::LeaseLock;
use crate::traits::LeaseStore;

/// Sleep bounds between polling attempts.
#[derive(Debug, Clone)]
pub struct BackoffOptions {
    pub min_sleep: Duration,
    pub max_sleep: Duration,
    pub multiplier: u32,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            min_sleep: Duration::from_millis(10),
            max_sleep: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl BackoffOptions {
    fn next(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.multiplier.max(1))
            .min(self.max_sleep)
            .max(self.min_sleep)
    }
}

/// Polls `lock.try_acquire()` until it succeeds.
///
/// `timeout = None` waits indefinitely. Every attempt refreshes the stored
/// `lastAccessed`, like any other acquire. Store errors end the wait
/// immediately.
#[instrument(
    skip(lock, backoff),
    fields(lock.name = %lock.name(), attempts = field::Empty, elapsed_ms = field::Empty)
)]
pub async fn acquire_with_backoff<S: LeaseStore>(
    lock: &mut LeaseLock<S>,
    timeout: Option<Duration>,
    backoff: &BackoffOptions,
) -> LockResult<()> {
    let start = Instant::now();
    let mut sleep_duration = backoff.min_sleep;
    let mut attempts = 0u64;

    loop {
        attempts += 1;
        if lock.try_acquire().await? {
            Span::current().record("attempts", attempts);
            Span::current().record("elapsed_ms", start.elapsed().as_millis() as u64);
            return Ok(());
        }

        if let Some(timeout) = timeout {
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                Span::current().record("attempts", attempts);
                return Err(LockError::Timeout(timeout));
            }
            sleep_duration = sleep_duration.min(timeout - elapsed);
        }

        sleep(with_jitter(sleep_duration)).await;
        sleep_duration = backoff.next(sleep_duration);
    }
}

/// Adds up to ±25% jitter so waiters on the same lease spread out.
fn with_jitter(duration: Duration) -> Duration {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    let range = millis / 4;
    if range == 0 {
        return duration;
    }
    let offset = rand::thread_rng().gen_range(0..=range.saturating_mul(2));
    Duration::from_millis((millis - range).saturating_add(offset))
}

//! Lease store with switchable outages, for error propagation tests.

use lease_lock_core::error::{LockError, LockResult};
use lease_lock_core::lease::{Lease, LockKey};
use lease_lock_core::memory::MemoryLeaseStore;
use lease_lock_core::traits::LeaseStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Wraps a [`MemoryLeaseStore`]; each operation can be made to fail with a
/// connection error.
#[derive(Clone, Default)]
pub struct FailingStore {
    inner: MemoryLeaseStore,
    fail_acquire: Arc<AtomicBool>,
    fail_probe: Arc<AtomicBool>,
    fail_release: Arc<AtomicBool>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryLeaseStore {
        &self.inner
    }

    pub fn fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }

    pub fn fail_probe(&self, fail: bool) {
        self.fail_probe.store(fail, Ordering::SeqCst);
    }

    pub fn fail_release(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }
}

fn outage() -> LockError {
    LockError::Connection(Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "store unavailable",
    )))
}

impl LeaseStore for FailingStore {
    async fn acquire_or_refresh(
        &self,
        key: &LockKey,
        token: &str,
        ttl: Duration,
    ) -> LockResult<Option<Lease>> {
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.acquire_or_refresh(key, token, ttl).await
    }

    async fn probe(&self, key: &LockKey, token: &str) -> LockResult<Option<Lease>> {
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.probe(key, token).await
    }

    async fn release_if_owned(&self, key: &LockKey, token: &str) -> LockResult<Option<Lease>> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.release_if_owned(key, token).await
    }
}

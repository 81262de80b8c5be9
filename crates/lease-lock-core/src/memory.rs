//! In-process lease store.
//!
//! Honours the same per-call atomicity as a real store by doing each
//! operation under one mutex. Useful for tests, benchmarks and callers whose
//! contenders all live in one process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use tracing::instrument;

use crate::error::LockResult;
use crate::lease::{Lease, LockKey};
use crate::lock::LeaseLock;
use crate::options::LeaseLockOptions;
use crate::traits::{LeaseLockProvider, LeaseStore};

/// A [`LeaseStore`] kept in memory. Clones share the same leases.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseStore {
    leases: Arc<Mutex<HashMap<LockKey, Lease>>>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored lease for `key`, whoever owns it.
    pub fn lease(&self, key: &LockKey) -> Option<Lease> {
        self.leases().get(key).cloned()
    }

    /// Number of stored leases.
    pub fn len(&self) -> usize {
        self.leases().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases().is_empty()
    }

    /// Removes every lease whose `expireAt` has passed, like a TTL index.
    ///
    /// Returns the number of leases removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(SystemTime::now())
    }

    /// Same as [`purge_expired`](Self::purge_expired) with an explicit clock.
    pub fn purge_expired_at(&self, now: SystemTime) -> usize {
        let mut leases = self.leases();
        let before = leases.len();
        leases.retain(|_, lease| !lease.is_expired_at(now));
        before - leases.len()
    }

    fn leases(&self) -> MutexGuard<'_, HashMap<LockKey, Lease>> {
        // A panic while holding the guard cannot leave a half-applied lease.
        self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LeaseStore for MemoryLeaseStore {
    #[instrument(skip(self, key, token), fields(lock.key = %key, backend = "memory"))]
    async fn acquire_or_refresh(
        &self,
        key: &LockKey,
        token: &str,
        ttl: Duration,
    ) -> LockResult<Option<Lease>> {
        let now = SystemTime::now();
        let mut leases = self.leases();

        let lease = leases
            .entry(key.clone())
            .and_modify(|lease| lease.refresh(now))
            .or_insert_with(|| Lease::create(key.name(), token, now, ttl));

        Ok(Some(lease.clone()))
    }

    #[instrument(skip(self, key, token), fields(lock.key = %key, backend = "memory"))]
    async fn probe(&self, key: &LockKey, token: &str) -> LockResult<Option<Lease>> {
        Ok(self
            .leases()
            .get(key)
            .filter(|lease| lease.is_owned_by(token))
            .cloned())
    }

    #[instrument(skip(self, key, token), fields(lock.key = %key, backend = "memory"))]
    async fn release_if_owned(&self, key: &LockKey, token: &str) -> LockResult<Option<Lease>> {
        let mut leases = self.leases();
        let owned = leases.get(key).is_some_and(|lease| lease.is_owned_by(token));
        Ok(if owned { leases.remove(key) } else { None })
    }
}

/// Provider handing out locks backed by a shared [`MemoryLeaseStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseLockProvider {
    store: MemoryLeaseStore,
    options: LeaseLockOptions,
}

impl MemoryLeaseLockProvider {
    pub fn new(store: MemoryLeaseStore) -> Self {
        Self::with_options(store, LeaseLockOptions::default())
    }

    pub fn with_options(store: MemoryLeaseStore, options: LeaseLockOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &MemoryLeaseStore {
        &self.store
    }
}

impl LeaseLockProvider for MemoryLeaseLockProvider {
    type Store = MemoryLeaseStore;

    fn create_lock(&self, name: &str) -> LockResult<LeaseLock<Self::Store>> {
        LeaseLock::with_options(self.store.clone(), name, &self.options)
    }
}

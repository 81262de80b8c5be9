//! Core traits for lease locks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LockResult;
use crate::lease::{Lease, LockKey};
use crate::lock::LeaseLock;

// ============================================================================
// Lease Store Trait
// ============================================================================

/// Atomic single-document operations a backing store must provide.
///
/// Every call is one round trip; implementations perform no retries and keep
/// no local cache. Any store giving the same atomicity per call (a document
/// store, a relational row under `SELECT ... FOR UPDATE`, a key-value store
/// with conditional put) can back a [`LeaseLock`].
///
/// # Example
///
/// ```rust,ignore
/// let key = LockKey::new("locks", "lock", "orders");
/// let lease = store.acquire_or_refresh(&key, &token, ttl).await?;
/// let owned = lease.is_some_and(|lease| lease.is_owned_by(&token));
/// ```
pub trait LeaseStore: Send + Sync {
    /// Atomically upserts the lease for `key` and returns the post-image.
    ///
    /// When no lease exists one is inserted with `token`, `created = now`,
    /// `expireAt = now + ttl` and `lastAccessed = now`. When one exists only
    /// `lastAccessed` is set to now; its token, creation time and expiry stay
    /// as they are. `None` means the store could not produce a document for
    /// this call (e.g. it lost an insert race) and counts as contention.
    fn acquire_or_refresh(
        &self,
        key: &LockKey,
        token: &str,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<Option<Lease>>> + Send;

    /// Reads the lease matching both `key` and `token`, without mutation.
    fn probe(
        &self,
        key: &LockKey,
        token: &str,
    ) -> impl Future<Output = LockResult<Option<Lease>>> + Send;

    /// Atomically deletes the lease matching both `key` and `token`.
    ///
    /// Returns the deleted lease, or `None` when nothing matched (already
    /// released, reaped by the store, or never owned).
    fn release_if_owned(
        &self,
        key: &LockKey,
        token: &str,
    ) -> impl Future<Output = LockResult<Option<Lease>>> + Send;
}

impl<S: LeaseStore> LeaseStore for Arc<S> {
    fn acquire_or_refresh(
        &self,
        key: &LockKey,
        token: &str,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<Option<Lease>>> + Send {
        (**self).acquire_or_refresh(key, token, ttl)
    }

    fn probe(
        &self,
        key: &LockKey,
        token: &str,
    ) -> impl Future<Output = LockResult<Option<Lease>>> + Send {
        (**self).probe(key, token)
    }

    fn release_if_owned(
        &self,
        key: &LockKey,
        token: &str,
    ) -> impl Future<Output = LockResult<Option<Lease>>> + Send {
        (**self).release_if_owned(key, token)
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Factory for creating lease locks by name.
///
/// Providers carry the store and the namespace/TTL configuration, so
/// application code only deals with lock names.
///
/// # Example
///
/// ```rust,ignore
/// let provider = MongoLeaseLockProvider::from_env().await?;
///
/// let mut lock = provider.create_lock("nightly-report")?;
/// if lock.try_acquire().await? {
///     lock.run_then_release(|| generate_report()).await?;
/// }
/// ```
pub trait LeaseLockProvider: Send + Sync {
    /// The store handles created by this provider talk to.
    type Store: LeaseStore;

    /// Creates a handle with a fresh token for the lock called `name`.
    fn create_lock(&self, name: &str) -> LockResult<LeaseLock<Self::Store>>;
}

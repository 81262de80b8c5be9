//! Lease lock handle.

use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use tracing::{Span, debug, field, instrument, warn};

use crate::error::{LockError, LockResult};
use crate::lease::{Lease, LockKey};
use crate::options::LeaseLockOptions;
use crate::token::generate_token;
use crate::traits::LeaseStore;

/// Ownership state as last observed by a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No acquisition has been attempted yet.
    Unknown,
    /// The last acquire found a lease carrying this handle's token.
    Held,
    /// The last acquire lost, or the handle released (or tried to).
    NotHeld,
}

/// Handle to a named lease lock.
///
/// Each handle mints its own token at construction and keeps it for life.
/// Ownership is decided entirely by the store: the first acquire to insert
/// the lease wins, every later acquire for that name only refreshes
/// `lastAccessed`.
///
/// Dropping a handle does not release the lease. Call [`release`] or use one
/// of the scoped helpers; otherwise the lease stays until store-side expiry
/// reaps it.
///
/// # Example
///
/// ```rust,ignore
/// let mut lock = LeaseLock::new(store, "invoice-run")?;
/// if lock.try_acquire().await? {
///     lock.run_then_release(|| async { run_invoices().await }).await?;
/// }
/// ```
///
/// [`release`]: LeaseLock::release
#[derive(Clone)]
pub struct LeaseLock<S> {
    store: S,
    key: LockKey,
    token: String,
    expiration: Duration,
    state: LockState,
    created: Option<SystemTime>,
    last_accessed: Option<SystemTime>,
}

impl<S: LeaseStore> LeaseLock<S> {
    /// Creates a handle in the default namespace with the default TTL.
    pub fn new(store: S, name: impl Into<String>) -> LockResult<Self> {
        Self::with_options(store, name, &LeaseLockOptions::default())
    }

    /// Creates a handle with an explicit namespace and TTL.
    pub fn with_options(
        store: S,
        name: impl Into<String>,
        options: &LeaseLockOptions,
    ) -> LockResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LockError::InvalidName(
                "lock name cannot be empty".to_string(),
            ));
        }
        options.validate()?;

        Ok(Self {
            store,
            key: LockKey::new(&options.database, &options.collection, name),
            token: generate_token(),
            expiration: options.expiration,
            state: LockState::Unknown,
            created: None,
            last_accessed: None,
        })
    }

    /// Attempts to take the lease once.
    ///
    /// Returns `Ok(true)` when the stored lease carries this handle's token,
    /// either because this call created it or because the handle already
    /// held it. Returns `Ok(false)` when another token owns it. A losing call
    /// still refreshes the stored `lastAccessed`.
    #[instrument(
        skip(self),
        fields(
            lock.name = %self.key.name(),
            lock.database = %self.key.database(),
            lock.collection = %self.key.collection(),
            acquired = field::Empty,
        )
    )]
    pub async fn try_acquire(&mut self) -> LockResult<bool> {
        let lease = self
            .store
            .acquire_or_refresh(&self.key, &self.token, self.expiration)
            .await?;

        match lease {
            Some(lease) if lease.is_owned_by(&self.token) => {
                self.observe(&lease);
                self.state = LockState::Held;
                Span::current().record("acquired", true);
                debug!("lease acquired");
                Ok(true)
            }
            other => {
                self.state = LockState::NotHeld;
                Span::current().record("acquired", false);
                debug!(holder = other.as_ref().map(Lease::token), "lease held elsewhere");
                Ok(false)
            }
        }
    }

    /// Checks whether the store still holds a lease with this handle's token.
    ///
    /// Never acquires and never refreshes. This is how a holder notices that
    /// the store reaped its lease.
    #[instrument(
        skip(self),
        fields(lock.name = %self.key.name(), owned = field::Empty)
    )]
    pub async fn check_ownership(&self) -> LockResult<bool> {
        let owned = self
            .store
            .probe(&self.key, &self.token)
            .await?
            .is_some_and(|lease| lease.is_owned_by(&self.token));

        Span::current().record("owned", owned);
        Ok(owned)
    }

    /// Deletes the lease if this handle owns it.
    ///
    /// Returns `Ok(false)` when there was nothing to delete, so releasing
    /// twice, or releasing without ever acquiring, is harmless.
    #[instrument(
        skip(self),
        fields(lock.name = %self.key.name(), released = field::Empty)
    )]
    pub async fn release(&mut self) -> LockResult<bool> {
        let deleted = self.store.release_if_owned(&self.key, &self.token).await?;
        self.state = LockState::NotHeld;

        let released = match deleted {
            Some(lease) => {
                self.observe(&lease);
                true
            }
            None => {
                debug!("release was a no-op, lease not owned");
                false
            }
        };

        Span::current().record("released", released);
        Ok(released)
    }

    /// Runs `work` and then releases, on every exit path.
    ///
    /// Does not acquire first; call [`try_acquire`](Self::try_acquire)
    /// beforehand. If `work` panics the lease is released and the panic
    /// resumed. If only the release fails, its error is returned.
    pub async fn run_then_release<F, Fut, T>(&mut self, work: F) -> LockResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let outcome = AssertUnwindSafe(async move { work().await })
            .catch_unwind()
            .await;
        let released = self.release().await;

        match outcome {
            Ok(value) => {
                released?;
                Ok(value)
            }
            Err(panic) => {
                if let Err(e) = released {
                    warn!(
                        lock.name = %self.key.name(),
                        error = %e,
                        "release failed after work panicked"
                    );
                }
                resume_unwind(panic)
            }
        }
    }

    /// Runs fallible `work` and then releases, on every exit path.
    ///
    /// An error from `work` is returned even if the release fails too; the
    /// release error is logged instead of replacing it.
    pub async fn try_run_then_release<F, Fut, T, E>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let outcome = AssertUnwindSafe(async move { work().await })
            .catch_unwind()
            .await;
        let released = self.release().await;

        match outcome {
            Ok(Ok(value)) => {
                released?;
                Ok(value)
            }
            Ok(Err(err)) => {
                if let Err(e) = released {
                    warn!(
                        lock.name = %self.key.name(),
                        error = %e,
                        "release failed after work returned an error"
                    );
                }
                Err(err)
            }
            Err(panic) => {
                if let Err(e) = released {
                    warn!(
                        lock.name = %self.key.name(),
                        error = %e,
                        "release failed after work panicked"
                    );
                }
                resume_unwind(panic)
            }
        }
    }

    fn observe(&mut self, lease: &Lease) {
        self.created = Some(lease.created());
        self.last_accessed = Some(lease.last_accessed());
    }
}

impl<S> LeaseLock<S> {
    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn database(&self) -> &str {
        self.key.database()
    }

    pub fn collection(&self) -> &str {
        self.key.collection()
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// TTL this handle requests when its acquire creates the lease.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// Creation time seen by the last successful acquire or release.
    pub fn created(&self) -> Option<SystemTime> {
        self.created
    }

    /// `lastAccessed` seen by the last successful acquire or release.
    pub fn last_accessed(&self) -> Option<SystemTime> {
        self.last_accessed
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns `true` if both handles target the same (database, collection,
    /// name), regardless of token.
    pub fn is_same_lock<T>(&self, other: &LeaseLock<T>) -> bool {
        self.key == other.key
    }
}

impl<S> PartialEq for LeaseLock<S> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.token == other.token
    }
}

impl<S> Eq for LeaseLock<S> {}

impl<S> fmt::Debug for LeaseLock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseLock")
            .field("key", &self.key)
            .field("token", &self.token)
            .field("expiration", &self.expiration)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

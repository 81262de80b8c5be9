//! Lease data model.
//!
//! A lease is the single document a store keeps per lock name. It is split
//! into two blocks so the atomicity contract is visible in the types:
//!
//! - [`LeaseIdentity`] is written by the insert that created the lease and is
//!   never touched again (`token`, `created`, `expireAt`).
//! - [`LeaseLiveness`] is overwritten by every acquire-or-refresh call from any
//!   contender, winning or losing (`lastAccessed`).

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Latest expiry a lease can carry (9999-12-31T23:59:59Z).
///
/// Stores with millisecond timestamps cannot represent much more than this,
/// and a TTL that large means "until explicitly released" anyway.
pub const MAX_EXPIRY_SECS: u64 = 253_402_300_799;

/// Identifies a lock: the (database, collection, name) triple.
///
/// Two handles with equal keys are the same lock, whatever their tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    database: String,
    collection: String,
    name: String,
}

impl LockKey {
    pub fn new(
        database: impl Into<String>,
        collection: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            name: name.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.database, self.collection, self.name)
    }
}

/// Immutable part of a lease, fixed by the insert that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseIdentity {
    /// Token of the handle whose insert created the lease.
    pub token: String,
    /// Creation time.
    pub created: SystemTime,
    /// Advisory expiry for store-side reaping. Never read by the protocol.
    pub expire_at: SystemTime,
}

/// Mutable part of a lease, refreshed by every acquire-or-refresh call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseLiveness {
    pub last_accessed: SystemTime,
}

/// A lease as stored for one lock name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub name: String,
    pub identity: LeaseIdentity,
    pub liveness: LeaseLiveness,
}

impl Lease {
    /// Builds the document the insert branch of acquire-or-refresh writes.
    pub fn create(
        name: impl Into<String>,
        token: impl Into<String>,
        now: SystemTime,
        ttl: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            identity: LeaseIdentity {
                token: token.into(),
                created: now,
                expire_at: expiry_after(now, ttl),
            },
            liveness: LeaseLiveness { last_accessed: now },
        }
    }

    /// Applies the update branch of acquire-or-refresh: only liveness changes.
    pub fn refresh(&mut self, now: SystemTime) {
        self.liveness.last_accessed = now;
    }

    pub fn token(&self) -> &str {
        &self.identity.token
    }

    pub fn created(&self) -> SystemTime {
        self.identity.created
    }

    pub fn expire_at(&self) -> SystemTime {
        self.identity.expire_at
    }

    pub fn last_accessed(&self) -> SystemTime {
        self.liveness.last_accessed
    }

    /// Returns `true` if this lease was created by `token`.
    pub fn is_owned_by(&self, token: &str) -> bool {
        self.identity.token == token
    }

    /// Returns `true` once `expireAt` is at or before `now`.
    ///
    /// Only store-side reaping consults this; the lock protocol never does.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.identity.expire_at <= now
    }
}

/// Computes `now + ttl`, saturating at [`MAX_EXPIRY_SECS`].
pub fn expiry_after(now: SystemTime, ttl: Duration) -> SystemTime {
    let max = UNIX_EPOCH + Duration::from_secs(MAX_EXPIRY_SECS);
    now.checked_add(ttl).map_or(max, |expiry| expiry.min(max))
}

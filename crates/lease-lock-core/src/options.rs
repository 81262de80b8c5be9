//! Lease lock configuration.

use std::time::Duration;

use crate::error::{LockError, LockResult};

/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "locks";

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "lock";

/// Default lease TTL: 36 500 days, i.e. until explicitly released.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(36_500 * 24 * 60 * 60);

/// Namespace and TTL a [`LeaseLock`](crate::lock::LeaseLock) is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseLockOptions {
    pub database: String,
    pub collection: String,
    /// TTL requested when this handle's acquire creates the lease.
    ///
    /// Ignored when another handle already created it.
    pub expiration: Duration,
}

impl LeaseLockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Rejects empty database or collection names.
    pub fn validate(&self) -> LockResult<()> {
        if self.database.is_empty() {
            return Err(LockError::InvalidConfiguration(
                "database name cannot be empty".to_string(),
            ));
        }
        if self.collection.is_empty() {
            return Err(LockError::InvalidConfiguration(
                "collection name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LeaseLockOptions {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            expiration: DEFAULT_EXPIRATION,
        }
    }
}

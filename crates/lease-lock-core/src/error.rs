//! Error types for lease lock operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during lease lock operations.
///
/// Contention is never reported through this type: losing a race, probing a
/// lease owned by another token or releasing a lease that is already gone all
/// surface as `Ok(false)` from the handle.
#[derive(Error, Debug)]
pub enum LockError {
    /// Polling acquisition gave up before the lease became available.
    #[error("lock acquisition timed out after {0:?}")]
    Timeout(Duration),

    /// The backing store could not be reached (I/O, server selection, auth).
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid lock name.
    #[error("invalid lock name: {0}")]
    InvalidName(String),

    /// Invalid namespace or provider configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Store-specific error.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for lease lock operations.
pub type LockResult<T> = Result<T, LockError>;

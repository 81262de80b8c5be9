//! Convenience prelude for lease lock types.

pub use crate::acquire::{BackoffOptions, acquire_with_backoff};
pub use crate::error::{LockError, LockResult};
pub use crate::lease::{Lease, LeaseIdentity, LeaseLiveness, LockKey};
pub use crate::lock::{LeaseLock, LockState};
pub use crate::memory::{MemoryLeaseLockProvider, MemoryLeaseStore};
pub use crate::options::LeaseLockOptions;
pub use crate::traits::{LeaseLockProvider, LeaseStore};

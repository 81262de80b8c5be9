//! Core types for lease locks: the lease model, the store contract and the
//! lock handle protocol.

pub mod acquire;
pub mod error;
pub mod lease;
pub mod lock;
pub mod memory;
pub mod options;
pub mod prelude;
pub mod token;
pub mod traits;

pub use error::{LockError, LockResult};
pub use prelude::*;

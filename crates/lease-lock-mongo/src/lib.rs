//! MongoDB backend for lease locks.

pub mod collection;
pub mod document;
mod error;
pub mod provider;
pub mod store;

pub use document::MongoLeaseDocument;
pub use provider::{MongoLeaseLockProvider, MongoLeaseLockProviderBuilder};
pub use store::MongoLeaseStore;

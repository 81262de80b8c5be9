//! Distributed lease locks for Rust.
//!
//! A lease lock is a named mutex shared by processes that share nothing but a
//! strongly consistent document store. Ownership lives in a single lease
//! document per lock name and is decided by the store's atomic
//! upsert-with-return and find-and-delete; there is no consensus protocol and
//! no in-process locking.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lease_lock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = MongoLeaseLockProvider::builder()
//!         .uri("mongodb://localhost:27017")
//!         .expiration(Duration::from_secs(60))
//!         .ensure_collection(true)
//!         .build()
//!         .await?;
//!
//!     let mut lock = provider.create_lock("nightly-report")?;
//!
//!     if lock.try_acquire().await? {
//!         // Released on every exit path, including panics.
//!         lock.run_then_release(|| async {
//!             println!("Doing critical work...");
//!         })
//!         .await?;
//!     } else {
//!         println!("Someone else is running the report");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Protocol
//!
//! - `try_acquire` upserts the lease: the first caller's insert writes its
//!   token, creation time and expiry; every later caller only refreshes
//!   `lastAccessed`. The caller wins iff the returned lease carries its token.
//! - `check_ownership` reads the lease by name and token.
//! - `release` deletes the lease by name and token; a second call is a no-op
//!   returning `false`.
//!
//! Expiry is written once, for a store-side TTL index to reap abandoned
//! leases. The handle never reads it back: a holder whose lease outlived its
//! TTL still owns it until the store deletes it.
//!
//! # Backends
//!
//! ## MongoDB
//!
//! ```rust,ignore
//! use lease_lock::MongoLeaseLockProvider;
//!
//! let provider = MongoLeaseLockProvider::from_env().await?;
//! ```
//!
//! ## In-memory
//!
//! Same contract inside one process; handy for tests.
//!
//! ```rust
//! use lease_lock::*;
//!
//! let provider = MemoryLeaseLockProvider::new(MemoryLeaseStore::new());
//! let lock = provider.create_lock("jobs").unwrap();
//! ```
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `lease-lock-core`: lease model, store contract, lock handle
//! - `lease-lock-mongo`: MongoDB backend

// Re-export core types and traits
pub use lease_lock_core::*;

// Re-export MongoDB backend
pub use lease_lock_mongo::{
    MongoLeaseDocument, MongoLeaseLockProvider, MongoLeaseLockProviderBuilder, MongoLeaseStore,
};

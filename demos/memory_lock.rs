//! Example: In-process lease locks
//!
//! Run with: `cargo run --example memory_lock`

use lease_lock::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = MemoryLeaseStore::new();
    let options = LeaseLockOptions::new().expiration(Duration::from_millis(200));
    let provider = MemoryLeaseLockProvider::with_options(store.clone(), options);

    let mut holder = provider.create_lock("jobs")?;
    let mut waiter = provider.create_lock("jobs")?;

    println!("Holder acquired: {}", holder.try_acquire().await?);
    println!("Waiter acquired: {}", waiter.try_acquire().await?);

    // The holder never releases; a reaper plays the part of a TTL index
    let reaper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        store.purge_expired()
    });

    acquire_with_backoff(&mut waiter, Some(Duration::from_secs(2)), &BackoffOptions::default())
        .await?;
    println!("Reaped {} expired lease(s)", reaper.await?);
    println!("Waiter acquired after reap, state {:?}", waiter.state());
    println!("Holder still owns: {}", holder.check_ownership().await?);

    let report = waiter
        .run_then_release(|| async { "report written" })
        .await?;
    println!("{report}; waiter released");

    Ok(())
}

//! Example: Using MongoDB-backed lease locks
//!
//! Run with: `MONGODB_URI=mongodb://localhost:27017 cargo run --example mongo_lock`

use lease_lock::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let uri = std::env::var(lease_lock_mongo::provider::MONGODB_URI_ENV)
        .unwrap_or_else(|_| lease_lock_mongo::provider::DEFAULT_MONGODB_URI.to_string());

    // Creates the collection with its validator and indexes on first use
    let provider = MongoLeaseLockProvider::builder()
        .uri(uri)
        .expiration(Duration::from_secs(60))
        .ensure_collection(true)
        .build()
        .await?;
    println!("Connected to MongoDB");

    let mut lock = provider.create_lock("example-resource")?;
    let mut rival = provider.create_lock("example-resource")?;
    println!("Created lock: {} in {}.{}", lock.name(), lock.database(), lock.collection());

    if lock.try_acquire().await? {
        println!("Lock acquired with token {}", lock.token());

        // A second handle is refused while the first holds the lease
        println!("Rival acquired: {}", rival.try_acquire().await?);

        lock.run_then_release(|| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            println!("Work completed");
        })
        .await?;
        println!("Lock released");
    } else {
        println!("Lock is currently held by another process");
    }

    // Poll until the lease is free or five seconds pass
    println!("\nAcquiring with 5 second timeout...");
    acquire_with_backoff(&mut rival, Some(Duration::from_secs(5)), &BackoffOptions::default())
        .await?;
    println!("Rival holds the lock: {}", rival.check_ownership().await?);
    rival.release().await?;

    Ok(())
}

//! Lock protocol tests against the in-memory store.

use lease_lock_core::prelude::*;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

mod common;
use common::failing_store::FailingStore;
use common::scenarios::{self, ScopeError};

fn provider() -> MemoryLeaseLockProvider {
    MemoryLeaseLockProvider::new(MemoryLeaseStore::new())
}

#[tokio::test]
async fn test_handoff() {
    scenarios::handoff(&provider(), "handoff").await;
}

#[tokio::test]
async fn test_idempotent_release() {
    scenarios::idempotent_release(&provider(), "idempotent").await;
}

#[tokio::test]
async fn test_loser_cannot_release() {
    scenarios::loser_cannot_release(&provider(), "loser").await;
}

#[tokio::test]
async fn test_identity_pinned_to_creator() {
    scenarios::identity_pinned_to_creator(&provider(), "identity").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mutual_exclusion() {
    scenarios::mutual_exclusion(Arc::new(provider()), "exclusive", 16).await;
}

#[tokio::test]
async fn test_scoped_release() {
    scenarios::scoped_release(&provider(), "scoped").await;
}

#[tokio::test]
async fn test_last_accessed_refreshed_by_losers() {
    let provider = provider();
    let mut winner = provider.create_lock("liveness").unwrap();
    let mut loser = provider.create_lock("liveness").unwrap();
    let store = provider.store();

    assert!(winner.try_acquire().await.unwrap());
    let mut previous = store.lease(winner.key()).unwrap().last_accessed();

    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!loser.try_acquire().await.unwrap());

        let lease = store.lease(winner.key()).unwrap();
        assert!(lease.last_accessed() >= previous);
        assert!(lease.is_owned_by(winner.token()));
        previous = lease.last_accessed();
    }
}

#[tokio::test]
async fn test_later_ttl_is_ignored() {
    let store = MemoryLeaseStore::new();
    let short = LeaseLockOptions::new().expiration(Duration::from_secs(30));
    let long = LeaseLockOptions::new().expiration(Duration::from_secs(3_600));

    let mut first = LeaseLock::with_options(store.clone(), "ttl", &short).unwrap();
    let mut second = LeaseLock::with_options(store.clone(), "ttl", &long).unwrap();

    assert!(first.try_acquire().await.unwrap());
    let expire_at = store.lease(first.key()).unwrap().expire_at();

    assert!(!second.try_acquire().await.unwrap());
    assert_eq!(store.lease(first.key()).unwrap().expire_at(), expire_at);
    assert!(expire_at <= SystemTime::now() + Duration::from_secs(30));
}

#[tokio::test]
async fn test_expired_lease_still_owned_until_reaped() {
    let store = MemoryLeaseStore::new();
    let options = LeaseLockOptions::new().expiration(Duration::from_millis(20));
    let mut holder = LeaseLock::with_options(store.clone(), "reaped", &options).unwrap();
    let mut waiter = LeaseLock::with_options(store.clone(), "reaped", &options).unwrap();

    assert!(holder.try_acquire().await.unwrap());
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Past its TTL, but nothing reaped it: the protocol never reads expireAt.
    assert!(holder.check_ownership().await.unwrap());
    assert!(!waiter.try_acquire().await.unwrap());

    assert_eq!(store.purge_expired(), 1);
    assert!(!holder.check_ownership().await.unwrap());
    assert!(waiter.try_acquire().await.unwrap());
    assert!(!holder.release().await.unwrap());
}

#[tokio::test]
async fn test_same_lock_and_equality() {
    let provider = provider();
    let a = provider.create_lock("same").unwrap();
    let b = provider.create_lock("same").unwrap();
    let c = provider.create_lock("different").unwrap();

    assert!(a.is_same_lock(&b));
    assert_ne!(a, b);
    assert_ne!(a.token(), b.token());
    assert_eq!(a, a.clone());
    assert!(!a.is_same_lock(&c));
}

#[tokio::test]
async fn test_failing_store_toggles_outage() {
    let store = FailingStore::new();
    let key = LockKey::new("locks", "lock", "toggle");

    store.fail_acquire(true);
    assert!(store.acquire_or_refresh(&key, "t1", Duration::from_secs(1)).await.is_err());

    store.fail_acquire(false);
    let lease = store
        .acquire_or_refresh(&key, "t1", Duration::from_secs(1))
        .await
        .unwrap();
    assert!(lease.is_some_and(|lease| lease.is_owned_by("t1")));
}

#[tokio::test]
async fn test_acquire_failure_propagates() {
    let store = FailingStore::new();
    let mut lock = LeaseLock::new(store.clone(), "outage").unwrap();

    store.fail_acquire(true);
    let result = lock.try_acquire().await;
    assert!(matches!(result, Err(LockError::Connection(_))));
    assert_eq!(lock.state(), LockState::Unknown);

    store.fail_acquire(false);
    assert!(lock.try_acquire().await.unwrap());
}

#[tokio::test]
async fn test_probe_and_release_failures_propagate() {
    let store = FailingStore::new();
    let mut lock = LeaseLock::new(store.clone(), "outage").unwrap();
    assert!(lock.try_acquire().await.unwrap());

    store.fail_probe(true);
    assert!(lock.check_ownership().await.is_err());

    store.fail_release(true);
    assert!(lock.release().await.is_err());
    assert_eq!(lock.state(), LockState::Held);
    assert!(store.inner().lease(lock.key()).is_some());
}

#[tokio::test]
async fn test_work_error_wins_over_release_error() {
    let store = FailingStore::new();
    let mut lock = LeaseLock::new(store.clone(), "scoped-outage").unwrap();
    assert!(lock.try_acquire().await.unwrap());

    store.fail_release(true);
    let result = lock
        .try_run_then_release(|| async { Err::<(), _>(ScopeError("job failed".to_string())) })
        .await;

    assert_eq!(result.unwrap_err().0, "job failed");
}

#[tokio::test]
async fn test_release_error_reported_after_successful_work() {
    let store = FailingStore::new();
    let mut lock = LeaseLock::new(store.clone(), "scoped-outage").unwrap();
    assert!(lock.try_acquire().await.unwrap());

    store.fail_release(true);
    let result = lock.run_then_release(|| async { "done" }).await;
    assert!(matches!(result, Err(LockError::Connection(_))));

    store.fail_release(false);
    assert!(lock.release().await.unwrap());
}

#[tokio::test]
async fn test_scoped_release_without_acquire() {
    let provider = provider();
    let mut lock = provider.create_lock("never-acquired").unwrap();

    let value = lock.run_then_release(|| async { 1 + 1 }).await.unwrap();
    assert_eq!(value, 2);
    assert_eq!(lock.state(), LockState::NotHeld);
}

#[tokio::test]
async fn test_acquire_with_backoff_after_reap() {
    let store = MemoryLeaseStore::new();
    let options = LeaseLockOptions::new().expiration(Duration::from_millis(10));
    let mut holder = LeaseLock::with_options(store.clone(), "backoff", &options).unwrap();
    let mut waiter = LeaseLock::with_options(store.clone(), "backoff", &options).unwrap();
    assert!(holder.try_acquire().await.unwrap());

    let reaper = {
        let store = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            store.purge_expired()
        })
    };

    acquire_with_backoff(&mut waiter, Some(Duration::from_secs(2)), &BackoffOptions::default())
        .await
        .unwrap();

    assert_eq!(reaper.await.unwrap(), 1);
    assert!(waiter.check_ownership().await.unwrap());
    assert!(!holder.check_ownership().await.unwrap());
}

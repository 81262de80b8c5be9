//! Lock protocol scenarios shared by every backend's tests.

use lease_lock_core::lock::LockState;
use lease_lock_core::traits::LeaseLockProvider;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

/// H1 acquires, H2 is refused, H1 releases, H2 acquires.
pub async fn handoff<P: LeaseLockProvider>(provider: &P, name: &str) {
    let mut h1 = provider.create_lock(name).unwrap();
    let mut h2 = provider.create_lock(name).unwrap();

    assert!(h1.try_acquire().await.unwrap());
    assert!(h1.check_ownership().await.unwrap());
    assert_eq!(h1.state(), LockState::Held);

    assert!(!h2.try_acquire().await.unwrap());
    assert!(!h2.check_ownership().await.unwrap());
    assert_eq!(h2.state(), LockState::NotHeld);

    assert!(h1.release().await.unwrap());
    assert!(!h1.check_ownership().await.unwrap());

    assert!(h2.try_acquire().await.unwrap());
    assert!(h2.release().await.unwrap());
}

/// The first release deletes the lease, the second is a no-op.
pub async fn idempotent_release<P: LeaseLockProvider>(provider: &P, name: &str) {
    let mut lock = provider.create_lock(name).unwrap();

    assert!(lock.try_acquire().await.unwrap());
    assert!(lock.release().await.unwrap());
    assert!(!lock.release().await.unwrap());
}

/// A handle that never won cannot release the winner's lease.
pub async fn loser_cannot_release<P: LeaseLockProvider>(provider: &P, name: &str) {
    let mut winner = provider.create_lock(name).unwrap();
    let mut loser = provider.create_lock(name).unwrap();

    assert!(winner.try_acquire().await.unwrap());
    assert!(!loser.try_acquire().await.unwrap());
    assert!(!loser.release().await.unwrap());
    assert!(winner.check_ownership().await.unwrap());

    assert!(winner.release().await.unwrap());
}

/// The lease keeps its creator's identity however often it is refreshed.
pub async fn identity_pinned_to_creator<P: LeaseLockProvider>(provider: &P, name: &str) {
    let mut winner = provider.create_lock(name).unwrap();
    let mut loser = provider.create_lock(name).unwrap();

    assert!(winner.try_acquire().await.unwrap());
    let created = winner.created().unwrap();
    let first_access = winner.last_accessed().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!loser.try_acquire().await.unwrap());
    assert!(winner.try_acquire().await.unwrap());

    assert_eq!(winner.created(), Some(created));
    assert!(winner.last_accessed().unwrap() >= first_access);

    assert!(winner.release().await.unwrap());
}

/// Many independent handles race; at most one is ever inside.
pub async fn mutual_exclusion<P>(provider: Arc<P>, name: &str, contenders: usize)
where
    P: LeaseLockProvider + 'static,
    P::Store: 'static,
{
    let inside = Arc::new(AtomicBool::new(false));
    let violations = Arc::new(AtomicUsize::new(0));
    let entries = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(contenders));

    let tasks: Vec<_> = (0..contenders)
        .map(|i| {
            let provider = provider.clone();
            let name = name.to_string();
            let inside = inside.clone();
            let violations = violations.clone();
            let entries = entries.clone();
            let start = start.clone();

            tokio::spawn(async move {
                let mut lock = provider.create_lock(&name).unwrap();
                start.wait().await;

                for _ in 0..5 {
                    if lock.try_acquire().await.unwrap() {
                        entries.fetch_add(1, Ordering::SeqCst);
                        if inside.swap(true, Ordering::SeqCst) {
                            violations.fetch_add(1, Ordering::SeqCst);
                        }
                        tokio::time::sleep(Duration::from_millis(1 + (i as u64 % 3))).await;
                        inside.store(false, Ordering::SeqCst);
                        assert!(lock.release().await.unwrap());
                    }
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(violations.load(Ordering::SeqCst), 0, "two holders were inside at once");
    assert!(entries.load(Ordering::SeqCst) >= 1);
}

/// Scoped execution releases even when the work fails.
pub async fn scoped_release<P: LeaseLockProvider>(provider: &P, name: &str) {
    let mut lock = provider.create_lock(name).unwrap();
    let mut other = provider.create_lock(name).unwrap();

    assert!(lock.try_acquire().await.unwrap());
    let result = lock
        .try_run_then_release(|| async { Err::<(), _>(ScopeError("job failed".to_string())) })
        .await;
    assert_eq!(result.unwrap_err().0, "job failed");

    assert!(other.try_acquire().await.unwrap());
    let value = other.run_then_release(|| async { 7 }).await.unwrap();
    assert_eq!(value, 7);
    assert!(!other.check_ownership().await.unwrap());
}

/// Error type for scoped work in [`scoped_release`].
#[derive(Debug)]
pub struct ScopeError(pub String);

impl From<lease_lock_core::error::LockError> for ScopeError {
    fn from(error: lease_lock_core::error::LockError) -> Self {
        Self(error.to_string())
    }
}

//! Per-session concurrency control.
//!
//! Only one chat turn runs per session at a time; a second turn for the same
//! session waits for the first to finish. Different sessions never block
//! each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Maps session ids to a `Semaphore(1)`. Holding the permit grants
/// exclusive access for one turn; it releases on drop.
#[derive(Default)]
pub struct SessionLockMap {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn semaphore(&self, session_id: &str) -> Arc<Semaphore> {
        self.locks
            .lock()
            .entry(session_id.to_owned())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone()
    }

    /// Wait for the run lock of a session.
    pub async fn acquire(&self, session_id: &str) -> Result<OwnedSemaphorePermit, SessionBusy> {
        self.semaphore(session_id)
            .acquire_owned()
            .await
            .map_err(|_| SessionBusy)
    }

    /// Take the lock only if no turn is in flight.
    pub fn try_acquire(&self, session_id: &str) -> Result<OwnedSemaphorePermit, SessionBusy> {
        self.semaphore(session_id)
            .try_acquire_owned()
            .map_err(|_| SessionBusy)
    }

    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Forget sessions with no turn in flight.
    pub fn prune_idle(&self) {
        self.locks
            .lock()
            .retain(|_, sem| sem.available_permits() == 0);
    }
}

/// The session already has a turn in progress.
#[derive(Debug)]
pub struct SessionBusy;

impl std::fmt::Display for SessionBusy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session is busy: a turn is already in progress")
    }
}

impl std::error::Error for SessionBusy {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequential_access() {
        let map = SessionLockMap::new();
        drop(map.acquire("s1").await.unwrap());
        drop(map.acquire("s1").await.unwrap());
    }

    #[tokio::test]
    async fn different_sessions_run_concurrently() {
        let map = SessionLockMap::new();
        let _p1 = map.acquire("s1").await.unwrap();
        let _p2 = map.acquire("s2").await.unwrap();
        assert_eq!(map.session_count(), 2);
    }

    #[tokio::test]
    async fn try_acquire_reports_busy() {
        let map = SessionLockMap::new();
        let held = map.acquire("s1").await.unwrap();
        assert!(map.try_acquire("s1").is_err());
        drop(held);
        assert!(map.try_acquire("s1").is_ok());
    }

    #[tokio::test]
    async fn same_session_waits() {
        let map = Arc::new(SessionLockMap::new());
        let map2 = map.clone();

        let p1 = map.acquire("s1").await.unwrap();
        let handle = tokio::spawn(async move {
            let _p2 = map2.acquire("s1").await.unwrap();
            42
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        drop(p1);

        assert_eq!(handle.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn prune_keeps_only_held_locks() {
        let map = SessionLockMap::new();
        let _held = map.acquire("busy").await.unwrap();
        drop(map.acquire("idle").await.unwrap());
        map.prune_idle();
        assert_eq!(map.session_count(), 1);
    }
}

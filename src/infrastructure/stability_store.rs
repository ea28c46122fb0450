//! In-memory stability store.
//!
//! Per-session state plus per-session advisory locks. Lock entries are
//! created lazily on first acquire and outlive the state: a `remove` drops
//! the state only, so a turn already queued on the session's lock still
//! serializes with turns arriving after the session ends.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::models::{SessionKey, StabilityState};
use crate::domain::ports::StabilityStore;

/// Process-local `StabilityStore` backed by a pair of maps.
#[derive(Default)]
pub struct InMemoryStabilityStore {
    states: RwLock<HashMap<SessionKey, StabilityState>>,
    locks: Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl InMemoryStabilityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with committed state.
    pub async fn session_count(&self) -> usize {
        self.states.read().await.len()
    }

    async fn lock_for(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }
}

#[async_trait]
impl StabilityStore for InMemoryStabilityStore {
    async fn acquire(&self, key: &SessionKey) -> OwnedMutexGuard<()> {
        self.lock_for(key).await.lock_owned().await
    }

    async fn load(&self, key: &SessionKey) -> Result<Option<StabilityState>> {
        Ok(self.states.read().await.get(key).cloned())
    }

    async fn store(&self, state: StabilityState) -> Result<()> {
        let mut states = self.states.write().await;
        // Optimistic check: a newer version must never be overwritten by a
        // staler one.
        if let Some(existing) = states.get(&state.key) {
            if existing.version > state.version {
                bail!(
                    "stale stability write for {}: stored version {} > incoming {}",
                    state.key,
                    existing.version,
                    state.version
                );
            }
        }
        states.insert(state.key.clone(), state);
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> Result<()> {
        // The lock entry stays: in-flight turns may hold a clone of the
        // session mutex, and replacing it would let two turns for the same
        // session run concurrently.
        self.states.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PriorityDomain, ResolvedActionPlan};
    use chrono::{TimeZone, Utc};

    fn state(version: u64) -> StabilityState {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 14, 0, 0).unwrap();
        let mut state = StabilityState::new(
            SessionKey::new("acme", "alice", "s-1"),
            ResolvedActionPlan::new(PriorityDomain::HealthWellbeing, now),
            80.0,
            now,
        );
        state.version = version;
        state
    }

    #[tokio::test]
    async fn test_load_round_trips() {
        let store = InMemoryStabilityStore::new();
        let key = SessionKey::new("acme", "alice", "s-1");

        assert!(store.load(&key).await.unwrap().is_none());
        store.store(state(1)).await.unwrap();
        let loaded = store.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_stale_write_rejected() {
        let store = InMemoryStabilityStore::new();
        store.store(state(3)).await.unwrap();
        assert!(store.store(state(2)).await.is_err());
        assert!(store.store(state(3)).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_clears_session() {
        let store = InMemoryStabilityStore::new();
        let key = SessionKey::new("acme", "alice", "s-1");
        store.store(state(1)).await.unwrap();
        assert_eq!(store.session_count().await, 1);

        store.remove(&key).await.unwrap();
        assert_eq!(store.session_count().await, 0);
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_acquire_serializes_same_session() {
        let store = Arc::new(InMemoryStabilityStore::new());
        let key = SessionKey::new("acme", "alice", "s-1");

        let guard = store.acquire(&key).await;
        let store2 = Arc::clone(&store);
        let key2 = key.clone();
        let contender = tokio::spawn(async move {
            let _g = store2.acquire(&key2).await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_still_serializes_after_remove() {
        let store = Arc::new(InMemoryStabilityStore::new());
        let key = SessionKey::new("acme", "alice", "s-1");
        store.store(state(1)).await.unwrap();

        let guard = store.acquire(&key).await;
        store.remove(&key).await.unwrap();

        let store2 = Arc::clone(&store);
        let key2 = key.clone();
        let contender = tokio::spawn(async move {
            let _g = store2.acquire(&key2).await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();
    }
}

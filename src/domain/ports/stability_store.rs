/// Stability store port (trait) for dependency injection.
///
/// Holds the per-session `StabilityState` and hands out per-session locks
/// so concurrent turns for the same session cannot compute against
/// conflicting "previous plan" baselines. Turns for different sessions are
/// fully independent.
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::domain::models::{SessionKey, StabilityState};

/// Store for per-session stability state.
#[async_trait]
pub trait StabilityStore: Send + Sync {
    /// Acquire the advisory lock for a session. Held for the duration of
    /// one arbitration so same-session turns serialize.
    async fn acquire(&self, key: &SessionKey) -> OwnedMutexGuard<()>;

    /// Load the current state for a session, if any.
    async fn load(&self, key: &SessionKey) -> Result<Option<StabilityState>>;

    /// Persist a confirmed state. Implementations may enforce an
    /// optimistic version check and reject stale writes.
    async fn store(&self, state: StabilityState) -> Result<()>;

    /// Discard a session's state immediately (explicit session end). Must
    /// not linger across sessions.
    async fn remove(&self, key: &SessionKey) -> Result<()>;
}

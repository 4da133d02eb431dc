//! Per-agent serialization of load-prune-persist cycles.
//!
//! `prune` itself is pure, but a scheduled callback and a manual caller
//! can both read, prune and write back the same agent's collections. Both
//! paths take the agent's lock for the whole cycle so one write cannot
//! silently discard the other's.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per agent name. Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct AgentLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AgentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutex_for(&self, agent: &str) -> Arc<Mutex<()>> {
        // Clone the Arc so the map shard is not held across an await.
        self.locks.entry(agent.to_string()).or_default().clone()
    }

    /// Wait for exclusive access to `agent`'s collections.
    pub async fn lock(&self, agent: &str) -> OwnedMutexGuard<()> {
        self.mutex_for(agent).lock_owned().await
    }

    /// Take the agent's lock only if nobody holds it.
    pub fn try_lock(&self, agent: &str) -> Option<OwnedMutexGuard<()>> {
        self.mutex_for(agent).try_lock_owned().ok()
    }

    /// Number of agents that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

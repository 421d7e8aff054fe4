//! Per-API-family mutual exclusion. Some Datadog endpoints reject or
//! corrupt concurrent writes from the same account (AWS integration, logs
//! pipelines, log destinations); adapters for those families take the
//! family lock before their first API call in Create/Update/Delete.
//!
//! Locks are process-local and keyed by family name, never by resource
//! identity. They are not re-entrant: a callback must not acquire the same
//! family twice.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Well-known family names.
pub const FAMILY_INTEGRATION_AWS: &str = "integration-aws";
pub const FAMILY_LOGS_PIPELINES: &str = "logs-pipelines";

#[derive(Default)]
pub struct LockRegistry {
    families: DashMap<String, Arc<Mutex<()>>>,
}

/// Scoped handle; the family lock is released when the guard drops, on every
/// exit path of the holding callback.
pub struct FamilyGuard {
    _guard: OwnedMutexGuard<()>,
    family: String,
}

impl Drop for FamilyGuard {
    fn drop(&mut self) {
        debug!(family = %self.family, "released api family lock");
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        LockRegistry::default()
    }

    /// Wait for and take the named family lock.
    pub async fn acquire(&self, family: &str) -> FamilyGuard {
        let mutex = self
            .families
            .entry(family.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        debug!(family, "acquired api family lock");
        FamilyGuard {
            _guard: guard,
            family: family.to_string(),
        }
    }
}

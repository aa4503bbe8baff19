//! In-process advisory locking of one refset
//!
//! Two reconciliations of the same refset computing plans from the same
//! stored state would both create the missing members. Runs on the same
//! (code system, refset) pair are serialized here; runs on different refsets
//! proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct RefsetLocks {
    enabled: bool,
    locks: Mutex<HashMap<(String, String), Arc<AsyncMutex<()>>>>,
}

impl RefsetLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Waits for the refset's lock
    ///
    /// Returns `None` when locking is disabled. The lock is released when
    /// the guard drops. Locks nobody holds or waits for are pruned here.
    pub async fn acquire(&self, code_system: &str, refset_id: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                locks
                    .entry((code_system.to_string(), refset_id.to_string()))
                    .or_default(),
            )
        };
        Some(lock.lock_owned().await)
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

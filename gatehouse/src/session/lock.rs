//! Per-session critical sections.
//!
//! Requests that present the same token (duplicate tabs, retries) serialize
//! on that token's mutex; requests for different sessions never contend.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Smallest table size at which dead entries are pruned
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Default)]
struct LockTable {
    entries: HashMap<String, Weak<Mutex<()>>>,
    /// Size at which the next prune runs; at least twice the live count
    /// left by the previous one
    prune_at: usize,
}

/// Lazily created mutex per session id.
///
/// The table only holds weak references, so a session's mutex is dropped as
/// soon as no request holds or waits on it. Dead entries are swept out once
/// the table has doubled since the last sweep, which keeps the scan cost
/// amortized even when most entries stay live.
#[derive(Default)]
pub struct TokenLocks {
    table: Mutex<LockTable>,
}

impl TokenLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a session id
    pub async fn acquire(&self, sid: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock().await;

            if table.entries.len() >= table.prune_at.max(PRUNE_THRESHOLD) {
                table.entries.retain(|_, weak| weak.strong_count() > 0);
                table.prune_at = (table.entries.len() * 2).max(PRUNE_THRESHOLD);
            }

            match table.entries.get(sid).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    table.entries.insert(sid.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }

    /// Number of entries currently in the table, live or dead
    pub async fn len(&self) -> usize {
        self.table.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn prune_at(&self) -> usize {
        self.table.lock().await.prune_at.max(PRUNE_THRESHOLD)
    }
}

//! Per-pull-request execution locks
//!
//! Two runs against the same pull request must never interleave: both would
//! try to move the same review records and status comment. Runs for different
//! pull requests proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes runs that target the same pull request within this process
#[derive(Clone, Default)]
pub struct PrLocks {
    // Entries are kept for the life of the process; one Arc<Mutex> per
    // distinct PR seen is small enough to never matter.
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl PrLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one pull request, waiting while another run holds it
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }
}

//! Per-show serialization of synchronization runs.
//!
//! A show update arriving while the maintenance sweep is regenerating the
//! same show waits for it to finish, so the "read existing events, decide,
//! write" sequence of one run never interleaves with another for that show.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use sp_domain::error::{Error, Result};

/// Each show id maps to a `Semaphore(1)`.
pub struct ShowLockMap {
    locks: Mutex<HashMap<Uuid, Arc<Semaphore>>>,
}

impl Default for ShowLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ShowLockMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `show_id`. The permit releases on drop.
    pub async fn acquire(&self, show_id: Uuid) -> Result<OwnedSemaphorePermit> {
        let sem = {
            let mut locks = self.locks.lock();
            locks
                .entry(show_id)
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };
        sem.acquire_owned()
            .await
            .map_err(|_| Error::Storage(format!("lock for show {show_id} was closed")))
    }

    pub fn show_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Drop locks for shows nobody holds or is about to acquire.
    ///
    /// A caller between cloning the semaphore and acquiring it still owns a
    /// reference, so only entries referenced by the map alone are removed.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, sem| Arc::strong_count(sem) > 1 || sem.available_permits() == 0);
    }
}

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per apartment key.
///
/// Holding the guard makes the read-decide-write sequence for that apartment
/// a critical section while other apartments proceed independently. A key's
/// entry lives only while someone holds or waits for it, so the map stays
/// bounded by the number of in-flight submissions.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Critical section for one key. Dropping it releases the key.
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    slot: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let slot = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(key.to_string()).or_default().clone()
        };
        let mut held = KeyGuard {
            locks: self,
            key: key.to_string(),
            slot,
            guard: None,
        };
        held.guard = Some(held.slot.clone().lock_owned().await);
        held
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self.locks.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this guard still reference the slot: no waiters.
        let ours = map.get(&self.key).is_some_and(|slot| Arc::ptr_eq(slot, &self.slot));
        if ours && Arc::strong_count(&self.slot) == 2 {
            map.remove(&self.key);
        }
    }
}

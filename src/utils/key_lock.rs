use futures::lock::Mutex;
use moka::future::Cache;
use std::{hash::Hash, sync::Arc, time::Duration};

/// Registry of async mutexes, one per key, so writers of the same key run one
/// at a time while different keys proceed in parallel. Idle entries expire.
///
/// An entry evicted while held lets a later caller through on a fresh mutex,
/// so the store transaction remains the authority on uniqueness.
#[derive(Clone)]
pub struct KeyLocks<K>
where
    K: Hash + Eq + Send + Sync + 'static,
{
    locks: Cache<K, Arc<Mutex<()>>>,
}

impl<K> KeyLocks<K>
where
    K: Hash + Eq + Send + Sync + Clone + 'static,
{
    pub fn new(max_capacity: u64, idle: Duration) -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Mutex guarding `key`; lock it and hold the guard for the critical section.
    pub async fn for_key(&self, key: K) -> Arc<Mutex<()>> {
        self.locks
            .get_with(key, async { Arc::new(Mutex::new(())) })
            .await
    }
}

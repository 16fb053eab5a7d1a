//! In-process store, mostly for tests and hosts without durable storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{BatchOp, KeyValueStore, StoreError};

/// A [`KeyValueStore`] backed by a `HashMap` behind a mutex.
///
/// Clones share the same map, so a second manager built over a clone sees
/// what the first one wrote, which is how tests simulate a page reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A batch never panics halfway, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let entries = self.lock();
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn apply(&self, batch: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut entries = self.lock();
        for op in batch {
            match op {
                BatchOp::Set { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

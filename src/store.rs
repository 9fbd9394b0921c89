//! In-process record stores.
//!
//! Pipelines and handlers only see the [`RecordStore`] trait, so a
//! persistent backing store can replace the process-lifetime map without
//! touching pipeline logic.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// String-keyed record storage. Mutation-after-analysis is expressed as
/// read-modify-insert; `insert` on an existing key replaces the record.
pub trait RecordStore<T: Clone>: Send + Sync {
    fn get(&self, id: &str) -> Option<T>;
    fn insert(&self, id: String, record: T);
    fn remove(&self, id: &str) -> Option<T>;
    fn list(&self) -> Vec<T>;
}

pub type SharedStore<T> = Arc<dyn RecordStore<T>>;

/// Process-lifetime in-memory store. All indexable metadata lives here and
/// is lost on restart.
pub struct MemoryStore<T> {
    records: RwLock<HashMap<String, T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> RecordStore<T> for MemoryStore<T> {
    fn get(&self, id: &str) -> Option<T> {
        self.records.read().get(id).cloned()
    }

    fn insert(&self, id: String, record: T) {
        self.records.write().insert(id, record);
    }

    fn remove(&self, id: &str) -> Option<T> {
        self.records.write().remove(id)
    }

    fn list(&self) -> Vec<T> {
        self.records.read().values().cloned().collect()
    }
}

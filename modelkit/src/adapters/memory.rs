//! In-memory adapter backed by per-collection maps.
//!
//! Data lives only as long as the adapter. Intended for tests and local
//! runs; the internal mutex makes the port usable across threads but this
//! is not a high-concurrency store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::Value;

use crate::mapper::Mapper;
use crate::{Adapter, ModelError, Record, RecordId};

#[derive(Default)]
struct CollectionStore {
    next_id: RecordId,
    records: BTreeMap<RecordId, Record>,
}

/// In-memory storage adapter.
pub struct MemoryAdapter {
    identity: HashMap<String, String>,
    stores: Mutex<HashMap<String, CollectionStore>>,
}

impl MemoryAdapter {
    /// Seed one empty store per collection declared in `mapper`.
    pub fn new(mapper: &Mapper) -> Self {
        let mut stores = HashMap::new();
        let mut identity = HashMap::new();
        for collection in mapper.collections() {
            stores.insert(collection.name.clone(), CollectionStore::default());
            identity.insert(collection.name.clone(), collection.identity.clone());
        }
        Self {
            identity,
            stores: Mutex::new(stores),
        }
    }

    fn identity_column(&self, collection: &str) -> Result<&str, ModelError> {
        self.identity
            .get(collection)
            .map(String::as_str)
            .ok_or_else(|| ModelError::UnknownCollection(collection.to_string()))
    }
}

impl Adapter for MemoryAdapter {
    fn create(&self, collection: &str, mut record: Record) -> Result<RecordId, ModelError> {
        let identity = self.identity_column(collection)?.to_string();
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let store = stores
            .get_mut(collection)
            .ok_or_else(|| ModelError::UnknownCollection(collection.to_string()))?;
        store.next_id += 1;
        let id = store.next_id;
        record.insert(identity, Value::from(id));
        store.records.insert(id, record);
        Ok(id)
    }

    fn find(&self, collection: &str, id: RecordId) -> Result<Option<Record>, ModelError> {
        let stores = self
            .stores
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let store = stores
            .get(collection)
            .ok_or_else(|| ModelError::UnknownCollection(collection.to_string()))?;
        Ok(store.records.get(&id).cloned())
    }

    fn all(&self, collection: &str) -> Result<Vec<Record>, ModelError> {
        let stores = self
            .stores
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let store = stores
            .get(collection)
            .ok_or_else(|| ModelError::UnknownCollection(collection.to_string()))?;
        Ok(store.records.values().cloned().collect())
    }

    fn update(&self, collection: &str, id: RecordId, mut record: Record) -> Result<(), ModelError> {
        let identity = self.identity_column(collection)?.to_string();
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let store = stores
            .get_mut(collection)
            .ok_or_else(|| ModelError::UnknownCollection(collection.to_string()))?;
        match store.records.get_mut(&id) {
            Some(existing) => {
                record.insert(identity, Value::from(id));
                *existing = record;
                Ok(())
            }
            None => Err(ModelError::NotFound),
        }
    }

    fn delete(&self, collection: &str, id: RecordId) -> Result<(), ModelError> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let store = stores
            .get_mut(collection)
            .ok_or_else(|| ModelError::UnknownCollection(collection.to_string()))?;
        match store.records.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ModelError::NotFound),
        }
    }

    fn clear(&self, collection: &str) -> Result<(), ModelError> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let store = stores
            .get_mut(collection)
            .ok_or_else(|| ModelError::UnknownCollection(collection.to_string()))?;
        store.records.clear();
        Ok(())
    }
}

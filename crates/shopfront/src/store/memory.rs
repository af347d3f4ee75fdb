//! In-memory document store for tests and dry runs.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Document, Filter, Store, StoreError, assign_id};
use async_trait::async_trait;

/// BTreeMap-backed store. Iteration order is by id, so scans are
/// deterministic for a given set of generated records.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, BTreeMap<Uuid, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, table: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.get(table).and_then(|docs| docs.get(&id)).cloned())
    }

    async fn insert(&self, table: &str, mut doc: Document) -> Result<Uuid, StoreError> {
        let id = assign_id(&mut doc);
        let mut inner = self.inner.write().await;
        inner.entry(table.to_string()).or_default().insert(id, doc);
        Ok(id)
    }

    async fn patch(&self, table: &str, id: Uuid, partial: Document) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let doc = inner
            .get_mut(table)
            .and_then(|docs| docs.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;

        if let (Some(target), Some(fields)) = (doc.as_object_mut(), partial.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .get_mut(table)
            .map(|docs| docs.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn query(&self, table: &str, filter: Filter) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .get(table)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, table: &str, filter: Filter) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .get(table)
            .map(|docs| docs.values().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }
}

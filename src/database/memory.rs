use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::store::{describe_key, matches_all, DocumentStore, Filter};

type Collection = BTreeMap<String, Value>;

/// Process-local document store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Value>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| matches_all(doc, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), DatabaseError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        unique: &[Filter],
    ) -> Result<(), DatabaseError> {
        // Check and insert under one write guard.
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.contains_key(id) {
            return Err(DatabaseError::AlreadyExists(format!("{}/{}", collection, id)));
        }
        if !unique.is_empty() && docs.values().any(|doc| matches_all(doc, unique)) {
            return Err(DatabaseError::AlreadyExists(describe_key(collection, unique)));
        }

        docs.insert(id.to_string(), data);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DatabaseError> {
        let mut collections = self.collections.write().await;
        match collections.get_mut(collection).and_then(|docs| docs.remove(id)) {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(format!("{}/{}", collection, id))),
        }
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

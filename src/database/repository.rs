use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::database::manager::DatabaseError;
use crate::database::store::{DocumentStore, Filter, Operator};

/// Typed view over one collection of the document store.
pub struct Repository<T> {
    collection: String,
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(collection: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: collection.into(),
            store,
            _phantom: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Every document in the collection. Order is whatever the store yields.
    pub async fn get_all(&self) -> Result<Vec<T>, DatabaseError> {
        let documents = self.store.get_all(&self.collection).await?;
        decode_all(documents)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<T, DatabaseError> {
        match self.store.get(&self.collection, id).await? {
            Some(document) => Ok(serde_json::from_value(document)?),
            None => Err(DatabaseError::NotFound(format!(
                "{} with id {}",
                self.collection, id
            ))),
        }
    }

    /// First document where `field <op> value`. Which match wins among several
    /// is unspecified.
    pub async fn get_first_by(
        &self,
        field: &str,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<T, DatabaseError> {
        let op: Operator = op.parse()?;
        let value = value.into();
        let matches = self
            .store
            .query(&self.collection, &[Filter::new(field, op, value.clone())])
            .await?;

        match matches.into_iter().next() {
            Some(document) => Ok(serde_json::from_value(document)?),
            None => Err(DatabaseError::NotFound(format!(
                "{} with {} {} {}",
                self.collection, field, op, value
            ))),
        }
    }

    pub async fn find(&self, filters: &[Filter]) -> Result<Vec<T>, DatabaseError> {
        let documents = self.store.query(&self.collection, filters).await?;
        decode_all(documents)
    }

    pub async fn set(&self, id: &str, data: &T) -> Result<(), DatabaseError> {
        let document = serde_json::to_value(data)?;
        self.store.set(&self.collection, id, document).await
    }

    /// Insert-if-absent, see [`DocumentStore::create`].
    pub async fn create(&self, id: &str, data: &T, unique: &[Filter]) -> Result<(), DatabaseError> {
        let document = serde_json::to_value(data)?;
        self.store.create(&self.collection, id, document, unique).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        self.store.delete(&self.collection, id).await
    }
}

fn decode_all<T: DeserializeOwned>(documents: Vec<Value>) -> Result<Vec<T>, DatabaseError> {
    documents
        .into_iter()
        .map(|document| serde_json::from_value(document).map_err(DatabaseError::from))
        .collect()
}

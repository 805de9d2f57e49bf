use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use super::{DocumentStore, Document, Fields, Query, StoreError, StoreResult, apply_queries};

type CollectionKey = (String, String);

/// In-process document store. Documents are kept per collection in
/// insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionKey, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in a collection.
    pub async fn count(&self, database: &str, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(&key(database, collection))
            .map_or(0, Vec::len)
    }
}

fn key(database: &str, collection: &str) -> CollectionKey {
    (database.to_string(), collection.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(key(database, collection)).or_default();
        if docs.iter().any(|d| d.id == id) {
            return Err(StoreError::Conflict(format!(
                "document {id} already exists in {collection}"
            )));
        }

        // Creation stamps are strictly increasing within a collection so that
        // newest-first listings are deterministic.
        let now = match docs.iter().map(|d| d.created_at).max() {
            Some(last) if last >= Utc::now() => last + Duration::microseconds(1),
            _ => Utc::now(),
        };
        let doc = Document {
            id: id.to_string(),
            collection_id: collection.to_string(),
            created_at: now,
            updated_at: now,
            fields,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn get_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> StoreResult<Document> {
        self.collections
            .read()
            .await
            .get(&key(database, collection))
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn list_documents(
        &self,
        database: &str,
        collection: &str,
        queries: &[Query],
    ) -> StoreResult<Vec<Document>> {
        let docs = self
            .collections
            .read()
            .await
            .get(&key(database, collection))
            .cloned()
            .unwrap_or_default();
        Ok(apply_queries(docs, queries))
    }

    async fn update_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(&key(database, collection))
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        doc.fields.extend(fields);
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(&key(database, collection))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

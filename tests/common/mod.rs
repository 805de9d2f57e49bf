#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use order_manager::{
    config::StoreConfig,
    retry::RetryPolicy,
    state::AppState,
    store::{Document, DocumentStore, Fields, IdGenerator, MemoryStore, Query, StoreError, StoreResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Get,
    List,
    Update,
    Delete,
}

struct Failure {
    skip: usize,
    times: usize,
    make: fn() -> StoreError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub collection: String,
    pub id: Option<String>,
}

/// MemoryStore wrapper that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Op, Failure>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` calls of `op` with the error built by `make`.
    pub fn fail(&self, op: Op, times: usize, make: fn() -> StoreError) {
        self.fail_after(op, 0, times, make);
    }

    /// Let `skip` calls of `op` through, then fail the next `times`.
    pub fn fail_after(&self, op: Op, skip: usize, times: usize, make: fn() -> StoreError) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, Failure { skip, times, make });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    fn record(&self, op: Op, collection: &str, id: Option<&str>) -> StoreResult<()> {
        self.calls.lock().unwrap().push(Call {
            op,
            collection: collection.to_string(),
            id: id.map(str::to_string),
        });

        let mut failures = self.failures.lock().unwrap();
        if let Some(failure) = failures.get_mut(&op) {
            if failure.skip > 0 {
                failure.skip -= 1;
            } else if failure.times > 0 {
                failure.times -= 1;
                return Err((failure.make)());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        self.record(Op::Create, collection, Some(id))?;
        self.inner.create_document(database, collection, id, fields).await
    }

    async fn get_document(&self, database: &str, collection: &str, id: &str) -> StoreResult<Document> {
        self.record(Op::Get, collection, Some(id))?;
        self.inner.get_document(database, collection, id).await
    }

    async fn list_documents(
        &self,
        database: &str,
        collection: &str,
        queries: &[Query],
    ) -> StoreResult<Vec<Document>> {
        self.record(Op::List, collection, None)?;
        self.inner.list_documents(database, collection, queries).await
    }

    async fn update_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        self.record(Op::Update, collection, Some(id))?;
        self.inner.update_document(database, collection, id, fields).await
    }

    async fn delete_document(&self, database: &str, collection: &str, id: &str) -> StoreResult<()> {
        self.record(Op::Delete, collection, Some(id))?;
        self.inner.delete_document(database, collection, id).await
    }
}

/// Ids `id-1`, `id-2`, ... in call order.
#[derive(Default)]
pub struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn unique(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub fn backend_error() -> StoreError {
    StoreError::Backend("connection reset".into())
}

pub fn unauthorized() -> StoreError {
    StoreError::Unauthorized("user is not authorized to perform the requested action (401)".into())
}

/// State over `store` with default collections, sequential ids and a
/// zero-delay three-attempt retry policy.
pub fn state_with(store: Arc<RecordingStore>) -> AppState {
    AppState::new(store, StoreConfig::default(), RetryPolicy::immediate(3))
        .with_ids(Arc::new(SequentialIds::default()))
}

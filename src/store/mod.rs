//! Document-store collaborator.
//!
//! Orders, their items and recipient records live in an external document
//! store addressed by database id, collection id and document id. Everything
//! in the service layer talks to it through [`DocumentStore`], so the backing
//! implementation ([`MemoryStore`] or [`PgDocumentStore`]) is picked once at
//! startup and passed in through `AppState`.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// User fields of a document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_))
    }
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document: system fields plus the user fields, flattened the
/// way the hosted store returns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$collectionId")]
    pub collection_id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Decode the whole document (system fields included) into a typed record.
    pub fn decode<T: DeserializeOwned>(self) -> StoreResult<T> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }

    /// Value used when sorting on `field`; system fields are addressed with a `$` prefix.
    fn sort_key(&self, field: &str) -> Value {
        match field {
            "$id" => Value::String(self.id.clone()),
            "$createdAt" => Value::String(self.created_at.to_rfc3339()),
            "$updatedAt" => Value::String(self.updated_at.to_rfc3339()),
            other => self.fields.get(other).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Serialize a record into the user fields of a document.
pub fn to_fields<T: Serialize>(record: &T) -> StoreResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "document fields must be an object, got {other}"
        ))),
    }
}

/// Filter predicates accepted by [`DocumentStore::list_documents`].
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal { field: String, value: Value },
    OrderDesc { field: String },
}

impl Query {
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn order_desc(field: impl Into<String>) -> Self {
        Query::OrderDesc {
            field: field.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Query::Equal { field, value } => match field.as_str() {
                "$createdAt" => parse_timestamp(value) == Some(doc.created_at),
                "$updatedAt" => parse_timestamp(value) == Some(doc.updated_at),
                field => values_equal(&doc.sort_key(field), value),
            },
            Query::OrderDesc { .. } => true,
        }
    }
}

/// RFC 3339 timestamp carried by a query value.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Equality as jsonb sees it: numbers compare by value, so `10` equals `10.0`.
fn values_equal(stored: &Value, probe: &Value) -> bool {
    match (stored, probe) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => stored == probe,
    }
}

/// Apply the equality filters and descending sorts of `queries` to `docs`.
/// The sort is stable, so documents that compare equal keep their input order.
pub fn apply_queries(mut docs: Vec<Document>, queries: &[Query]) -> Vec<Document> {
    docs.retain(|doc| queries.iter().all(|q| q.matches(doc)));

    let sorts: Vec<&str> = queries
        .iter()
        .filter_map(|q| match q {
            Query::OrderDesc { field } => Some(field.as_str()),
            Query::Equal { .. } => None,
        })
        .collect();

    if !sorts.is_empty() {
        docs.sort_by(|a, b| {
            sorts
                .iter()
                .map(|field| compare_values(&b.sort_key(field), &a.sort_key(field)))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
    docs
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document>;

    async fn get_document(&self, database: &str, collection: &str, id: &str)
    -> StoreResult<Document>;

    async fn list_documents(
        &self,
        database: &str,
        collection: &str,
        queries: &[Query],
    ) -> StoreResult<Vec<Document>>;

    /// Merge `fields` into the stored document; fields not named are left untouched.
    async fn update_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document>;

    async fn delete_document(&self, database: &str, collection: &str, id: &str)
    -> StoreResult<()>;
}

pub trait IdGenerator: Send + Sync {
    fn unique(&self) -> String;
}

/// 32 hex characters from a random v4 uuid.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn unique(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

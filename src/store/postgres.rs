use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, QueryFilter,
    QueryOrder, Select, SqlErr,
};
use serde_json::Value;

use super::{DocumentStore, Document, Fields, Query, StoreError, StoreResult, parse_timestamp};
use crate::entity::documents::{ActiveModel as DocumentActive, Column as DocCol, Entity as Documents, Model as DocumentModel};

/// Document store backed by a single PostgreSQL `documents` table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    conn: DatabaseConnection,
}

impl PgDocumentStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn scoped(database: &str, collection: &str) -> Select<Documents> {
        Documents::find()
            .filter(DocCol::DatabaseId.eq(database))
            .filter(DocCol::CollectionId.eq(collection))
    }

    async fn find(&self, database: &str, collection: &str, id: &str) -> StoreResult<DocumentModel> {
        Documents::find_by_id((database.to_string(), collection.to_string(), id.to_string()))
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found(collection, id))
    }
}

fn document_from_entity(model: DocumentModel) -> Document {
    let fields = match model.data {
        Value::Object(map) => map,
        _ => Fields::new(),
    };
    Document {
        id: model.id,
        collection_id: model.collection_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        fields,
    }
}

fn map_write_err(err: DbErr, collection: &str, id: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Conflict(format!(
            "document {id} already exists in {collection}"
        )),
        _ => StoreError::from(err),
    }
}

/// User field names end up inside SQL text for sorting, so only plain
/// identifiers are accepted.
fn checked_field(field: &str) -> StoreResult<&str> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(field)
    } else {
        Err(StoreError::Backend(format!("unsupported query field `{field}`")))
    }
}

fn apply_query(finder: Select<Documents>, query: &Query) -> StoreResult<Select<Documents>> {
    let finder = match query {
        Query::Equal { field, value } => match field.as_str() {
            "$id" => {
                let id = value.as_str().unwrap_or_default().to_string();
                finder.filter(DocCol::Id.eq(id))
            }
            "$createdAt" | "$updatedAt" => {
                let at = parse_timestamp(value).ok_or_else(|| {
                    StoreError::Backend(format!("`{field}` expects an RFC 3339 timestamp, got {value}"))
                })?;
                let column = if field == "$createdAt" {
                    DocCol::CreatedAt
                } else {
                    DocCol::UpdatedAt
                };
                finder.filter(column.eq(at.fixed_offset()))
            }
            field => {
                let field = checked_field(field)?;
                let mut probe = Fields::new();
                probe.insert(field.to_string(), value.clone());
                let probe = Value::Object(probe).to_string();
                finder.filter(Expr::cust_with_values("data @> ?::jsonb", [probe]))
            }
        },
        Query::OrderDesc { field } => match field.as_str() {
            "$createdAt" => finder.order_by_desc(DocCol::CreatedAt),
            "$updatedAt" => finder.order_by_desc(DocCol::UpdatedAt),
            "$id" => finder.order_by_desc(DocCol::Id),
            field => {
                let field = checked_field(field)?;
                finder.order_by(Expr::cust(format!("data -> '{field}'")), Order::Desc)
            }
        },
    };
    Ok(finder)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        let now = Utc::now();
        let model = DocumentActive {
            database_id: Set(database.to_string()),
            collection_id: Set(collection.to_string()),
            id: Set(id.to_string()),
            data: Set(Value::Object(fields)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.conn)
        .await
        .map_err(|err| map_write_err(err, collection, id))?;

        Ok(document_from_entity(model))
    }

    async fn get_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> StoreResult<Document> {
        self.find(database, collection, id)
            .await
            .map(document_from_entity)
    }

    async fn list_documents(
        &self,
        database: &str,
        collection: &str,
        queries: &[Query],
    ) -> StoreResult<Vec<Document>> {
        let mut finder = Self::scoped(database, collection);
        for query in queries {
            finder = apply_query(finder, query)?;
        }

        // insertion order breaks ties
        let docs = finder
            .order_by_asc(DocCol::CreatedAt)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(document_from_entity)
            .collect();
        Ok(docs)
    }

    async fn update_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Document> {
        let existing = self.find(database, collection, id).await?;

        let mut data = match existing.data.clone() {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        data.extend(fields);

        let mut active: DocumentActive = existing.into();
        active.data = Set(Value::Object(data));
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&self.conn).await?;

        Ok(document_from_entity(model))
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> StoreResult<()> {
        let result =
            Documents::delete_by_id((database.to_string(), collection.to_string(), id.to_string()))
                .exec(&self.conn)
                .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

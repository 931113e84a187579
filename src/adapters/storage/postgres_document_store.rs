//! PostgreSQL implementation of DocumentStore.
//!
//! Every collection shares one `documents` table; the document itself is a
//! JSONB column. Filters and sorts compare `body -> 'field'` with a missing
//! key read as JSON `null`, the same as the in-memory store. The `seq`
//! column preserves insertion order.

use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::config::DatabaseConfig;
use crate::domain::foundation::{
    Condition, DomainError, ErrorCode, Filter, PageQuery, RecordId, SortDirection,
};
use crate::ports::{document_id, DocumentStore};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        seq BIGSERIAL NOT NULL,
        collection TEXT NOT NULL,
        id UUID NOT NULL,
        body JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_collection_seq_idx ON documents (collection, seq)";

/// PostgreSQL-backed document store.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from configuration, creating the schema if asked to.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout())
            .idle_timeout(config.pool.idle_timeout())
            .max_lifetime(config.pool.max_lifetime())
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::database("Failed to connect to PostgreSQL", e))?;
        tracing::info!(
            url = %config.display_url(),
            max_connections = config.pool.max_connections,
            "connected to PostgreSQL"
        );

        let store = Self::new(pool);
        if config.ensure_schema {
            store.ensure_schema().await?;
        }
        Ok(store)
    }

    /// Creates the `documents` table and its index when missing.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to create documents schema", e))?;
        }
        tracing::info!("documents schema ready");
        Ok(())
    }
}

/// Pushes the value of `field`, with a missing key read as JSON `null`.
fn push_field(qb: &mut QueryBuilder<'_, Postgres>, field: &str) {
    qb.push("COALESCE(body -> ")
        .push_bind(field.to_string())
        .push(", 'null'::jsonb)");
}

/// Appends ` AND <condition>` for every filter condition.
fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for (field, condition) in filter.conditions() {
        qb.push(" AND ");
        push_field(qb, field);
        match condition {
            Condition::Eq(value) => {
                qb.push(" = ").push_bind(Json(value.clone()));
            }
            Condition::In(values) => {
                let values: Vec<Json<JsonValue>> = values.iter().cloned().map(Json).collect();
                qb.push(" = ANY(").push_bind(values).push(")");
            }
            Condition::Ne(value) => {
                qb.push(" IS DISTINCT FROM ").push_bind(Json(value.clone()));
            }
        }
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Option<&PageQuery>) {
    let Some(page) = page else {
        qb.push(" ORDER BY seq ASC");
        return;
    };

    match &page.sort {
        Some(sort) => {
            let direction = match sort.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            qb.push(" ORDER BY ");
            push_field(qb, &sort.field);
            qb.push(" ").push(direction).push(", id ASC");
        }
        None => {
            qb.push(" ORDER BY seq ASC");
        }
    }
    if let Some(limit) = page.limit {
        qb.push(" LIMIT ").push_bind(to_i64(limit));
    }
    if page.skip > 0 {
        qb.push(" OFFSET ").push_bind(to_i64(page.skip));
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn select_query<'a>(
    collection: &str,
    filter: &Filter,
    page: Option<&PageQuery>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
    qb.push_bind(collection.to_string());
    push_conditions(&mut qb, filter);
    push_page(&mut qb, page);
    qb
}

fn count_query<'a>(collection: &str, filter: &Filter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM documents WHERE collection = ");
    qb.push_bind(collection.to_string());
    push_conditions(&mut qb, filter);
    qb
}

fn delete_many_query<'a>(collection: &str, filter: &Filter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("DELETE FROM documents WHERE collection = ");
    qb.push_bind(collection.to_string());
    push_conditions(&mut qb, filter);
    qb
}

fn delete_one_query<'a>(collection: &str, filter: &Filter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("DELETE FROM documents WHERE collection = ");
    qb.push_bind(collection.to_string());
    qb.push(" AND seq = (SELECT seq FROM documents WHERE collection = ");
    qb.push_bind(collection.to_string());
    push_conditions(&mut qb, filter);
    qb.push(" ORDER BY seq ASC LIMIT 1)");
    qb
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, collection: &str, document: JsonValue) -> Result<JsonValue, DomainError> {
        let id = document_id(&document)?;

        let row = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            RETURNING body
            "#,
        )
        .bind(collection)
        .bind(id.as_uuid())
        .bind(Json(&document))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert document", e))?;

        match row {
            Some(row) => decode_body(&row),
            None => Err(DomainError::new(
                ErrorCode::DuplicateKey,
                format!("Document {} already exists in '{}'", id, collection),
            )),
        }
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        page: Option<&PageQuery>,
    ) -> Result<Vec<JsonValue>, DomainError> {
        let rows = select_query(collection, filter, page)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch documents", e))?;

        rows.iter().map(decode_body).collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError> {
        let count: i64 = count_query(collection, filter)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to count documents", e))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn update_one(
        &self,
        collection: &str,
        id: RecordId,
        patch: JsonMap<String, JsonValue>,
    ) -> Result<Option<JsonValue>, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE documents SET body = body || $3
            WHERE collection = $1 AND id = $2
            RETURNING body
            "#,
        )
        .bind(collection)
        .bind(id.as_uuid())
        .bind(Json(JsonValue::Object(patch)))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update document", e))?;

        row.as_ref().map(decode_body).transpose()
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError> {
        let result = delete_one_query(collection, filter)
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete document", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError> {
        let result = delete_many_query(collection, filter)
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete documents", e))?;

        Ok(result.rows_affected())
    }
}

fn decode_body(row: &sqlx::postgres::PgRow) -> Result<JsonValue, DomainError> {
    let Json(body) = row
        .try_get::<Json<JsonValue>, _>("body")
        .map_err(|e| DomainError::database("Failed to decode document body", e))?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_without_page_orders_by_insertion() {
        let qb = select_query("nlpentities", &Filter::new(), None);
        assert_eq!(
            qb.sql(),
            "SELECT body FROM documents WHERE collection = $1 ORDER BY seq ASC"
        );
    }

    #[test]
    fn conditions_bind_field_names_and_values() {
        let filter = Filter::new()
            .eq("name", "intent")
            .is_in("lookups", ["trait"])
            .ne("builtin", true);
        let qb = select_query("nlpentities", &filter, None);

        assert_eq!(
            qb.sql(),
            "SELECT body FROM documents WHERE collection = $1 \
             AND COALESCE(body -> $2, 'null'::jsonb) IS DISTINCT FROM $3 \
             AND COALESCE(body -> $4, 'null'::jsonb) = ANY($5) \
             AND COALESCE(body -> $6, 'null'::jsonb) = $7 \
             ORDER BY seq ASC"
        );
    }

    #[test]
    fn sorted_page_breaks_ties_by_id() {
        let page = PageQuery::sorted("name", "desc").unwrap().skip(5).limit(10);
        let qb = select_query("nlpentities", &Filter::new(), Some(&page));

        assert_eq!(
            qb.sql(),
            "SELECT body FROM documents WHERE collection = $1 \
             ORDER BY COALESCE(body -> $2, 'null'::jsonb) DESC, id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn delete_one_targets_first_match_by_sequence() {
        let qb = delete_one_query("nlpvalues", &Filter::by_id(RecordId::new()));
        assert_eq!(
            qb.sql(),
            "DELETE FROM documents WHERE collection = $1 \
             AND seq = (SELECT seq FROM documents WHERE collection = $2 \
             AND COALESCE(body -> $3, 'null'::jsonb) = $4 ORDER BY seq ASC LIMIT 1)"
        );
    }

    #[test]
    fn count_and_delete_many_share_the_where_clause() {
        let filter = Filter::new().eq("entity", "x");
        assert_eq!(
            count_query("nlpvalues", &filter).sql(),
            "SELECT COUNT(*) FROM documents WHERE collection = $1 \
             AND COALESCE(body -> $2, 'null'::jsonb) = $3"
        );
        assert_eq!(
            delete_many_query("nlpvalues", &filter).sql(),
            "DELETE FROM documents WHERE collection = $1 \
             AND COALESCE(body -> $2, 'null'::jsonb) = $3"
        );
    }

    #[test]
    fn null_comparisons_cover_missing_fields() {
        let filter = Filter::new().ne("doc", JsonValue::Null);
        let page = PageQuery::sorted("doc", "asc").unwrap();
        let sql = select_query("nlpentities", &filter, Some(&page)).sql().to_string();

        assert!(!sql.contains(" body -> "));
        assert_eq!(sql.matches("COALESCE(body -> ").count(), 2);
        assert!(sql.contains("ORDER BY COALESCE(body -> $3, 'null'::jsonb) ASC, id ASC"));
    }
}

//! PostgreSQL document store: one JSONB table per entity inside a configurable schema.

use crate::config::Settings;
use crate::entities::EntityDef;
use crate::error::AppError;
use crate::query::FilterSet;
use crate::sql::{self, bind_all, QueryBuf};
use crate::store::{DocumentStore, PageResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgConnection, PgPool};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDocumentStore {
            pool,
            schema: schema.into(),
        }
    }

    /// Creates the database when missing, then opens a pool.
    pub async fn connect(settings: &Settings) -> Result<Self, AppError> {
        ensure_database_exists(&settings.database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.database_url)
            .await?;
        Ok(PgDocumentStore::new(pool, settings.schema.clone()))
    }

    async fn fetch_docs(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query_scalar::<_, Value>(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_doc(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(sqlx::query_scalar::<_, Value>(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

fn with_id(mut doc: Map<String, Value>, id: Uuid) -> Value {
    doc.insert("id".into(), Value::String(id.to_string()));
    Value::Object(doc)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ensure_tables(&self, entities: &[&'static EntityDef]) -> Result<(), AppError> {
        sqlx::query(&sql::create_schema(&self.schema))
            .execute(&self.pool)
            .await?;
        for entity in entities {
            let ddl = sql::create_table(&self.schema, entity);
            tracing::debug!(sql = %ddl, "ddl");
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        tracing::info!(schema = %self.schema, count = entities.len(), "document tables ready");
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn query(
        &self,
        entity: &EntityDef,
        filters: &FilterSet,
        projection: Option<&[&str]>,
    ) -> Result<PageResult, AppError> {
        let limit = filters.pagination().map(|p| p.limit).unwrap_or(crate::query::pagination::DEFAULT_LIMIT);
        let q = sql::select_page(&self.schema, entity, filters, projection);
        let rows = self.fetch_docs(&q).await?;
        Ok(PageResult::from_window(rows, limit))
    }

    async fn find_by_id(
        &self,
        entity: &EntityDef,
        id: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Value>, AppError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(None) };
        self.fetch_doc(&sql::select_by_id(&self.schema, entity, id, projection)).await
    }

    async fn insert(&self, entity: &EntityDef, doc: Map<String, Value>) -> Result<Value, AppError> {
        let id = Uuid::new_v4();
        let q = sql::insert(&self.schema, entity, id, with_id(doc, id));
        self.fetch_doc(&q)
            .await?
            .ok_or_else(|| AppError::Internal(format!("insert into {} returned no row", entity.table)))
    }

    async fn replace(
        &self,
        entity: &EntityDef,
        id: &str,
        doc: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(None) };
        self.fetch_doc(&sql::replace(&self.schema, entity, id, with_id(doc, id))).await
    }

    async fn delete(&self, entity: &EntityDef, id: &str) -> Result<bool, AppError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(false) };
        let q = sql::delete(&self.schema, entity, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let deleted = bind_all(sqlx::query_scalar::<_, Uuid>(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deleted.is_some())
    }
}

/// Database named by `opts` when it must be created up front. The maintenance
/// database itself, or a URL without a name, needs nothing.
fn database_to_create(opts: &PgConnectOptions) -> Option<String> {
    opts.get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "postgres")
        .map(str::to_string)
}

/// Creates the database named in `database_url` through the `postgres` maintenance database.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let target = PgConnectOptions::from_str(database_url)?;
    let Some(name) = database_to_create(&target) else { return Ok(()) };
    let mut conn: PgConnection = target.database("postgres").connect().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %name, "creating database");
        sqlx::query(&sql::create_database(&name)).execute(&mut conn).await?;
    }
    Ok(())
}

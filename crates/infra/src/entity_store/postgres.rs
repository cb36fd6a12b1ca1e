//! Postgres-backed document store.
//!
//! Every collection shares one `entity_documents` table; each row is a whole
//! document in a `jsonb` column keyed by `(collection, id)`. Filters are
//! rendered to parameterized SQL over `doc`, so field names behave exactly as
//! they do in the in-memory store.
//!
//! A partial unique index over `(collection, doc->>'code')` restricted to live
//! documents makes code uniqueness authoritative: a racing duplicate insert is
//! rejected with [`StoreError::UniqueViolation`].

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row};
use tracing::debug;

use atelier_core::{Document, EntityId};

use super::filter::Filter;
use super::r#trait::{EntityStore, Page, PageRequest, StoreError};
use crate::config::{StoreBackend, StoreConfig};

const UNIQUE_VIOLATION: &str = "23505";
const PRIMARY_KEY: &str = "entity_documents_pkey";
const LIVE_CODE_INDEX: &str = "entity_documents_live_code";

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS entity_documents (
        collection TEXT NOT NULL,
        id UUID NOT NULL,
        doc JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS entity_documents_live_code
        ON entity_documents (collection, (doc ->> 'code'))
        WHERE (doc ->> '_deleted')::boolean IS NOT TRUE
    "#,
];

/// Open a connection pool for the configured Postgres backend.
pub async fn connect(config: &StoreConfig) -> Result<PgPool, StoreError> {
    let StoreBackend::Postgres { database_url } = &config.backend else {
        return Err(StoreError::InvalidQuery(
            "store backend is not postgres".to_string(),
        ));
    };

    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await?)
}

/// Create the document table and its indexes (idempotent).
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Postgres-backed [`EntityStore`] for one document type.
pub struct PostgresEntityStore<T> {
    pool: Arc<PgPool>,
    _record: PhantomData<fn() -> T>,
}

impl<T> PostgresEntityStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self::from_shared(Arc::new(pool))
    }

    /// Share one pool across collections.
    pub fn from_shared(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

/// A bind parameter collected while rendering SQL.
#[derive(Debug, Clone, PartialEq)]
enum SqlArg {
    Text(String),
    Json(JsonValue),
    BigInt(i64),
}

/// Accumulates SQL text and its positional parameters.
#[derive(Debug, Default)]
struct SqlBuilder {
    sql: String,
    args: Vec<SqlArg>,
}

impl SqlBuilder {
    fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    fn bind(&mut self, arg: SqlArg) -> &mut Self {
        self.args.push(arg);
        let placeholder = format!("${}", self.args.len());
        self.sql.push_str(&placeholder);
        self
    }

    fn predicate(&mut self, filter: &Filter) -> &mut Self {
        match filter {
            Filter::All => self.push("TRUE"),
            Filter::Eq(field, value) => self
                .push("(doc -> ")
                .bind(SqlArg::Text(field.clone()))
                .push(") = ")
                .bind(SqlArg::Json(value.clone())),
            Filter::Ne(field, value) => self
                .push("(doc -> ")
                .bind(SqlArg::Text(field.clone()))
                .push(") IS DISTINCT FROM ")
                .bind(SqlArg::Json(value.clone())),
            Filter::Matches {
                field,
                pattern,
                case_insensitive,
            } => {
                let op = if *case_insensitive { " ~* " } else { " ~ " };
                self.push("(doc ->> ")
                    .bind(SqlArg::Text(field.clone()))
                    .push(")")
                    .push(op)
                    .bind(SqlArg::Text(pattern.clone()))
            }
            Filter::And(parts) => self.join(parts, " AND ", "TRUE"),
            Filter::Or(parts) => self.join(parts, " OR ", "FALSE"),
        }
    }

    fn join(&mut self, parts: &[Filter], sep: &str, empty: &str) -> &mut Self {
        if parts.is_empty() {
            return self.push(empty);
        }
        self.push("(");
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            self.predicate(part);
        }
        self.push(")")
    }

    fn scoped(collection: &str, filter: &Filter) -> Self {
        let mut builder = SqlBuilder::default();
        builder
            .push("collection = ")
            .bind(SqlArg::Text(collection.to_string()))
            .push(" AND ")
            .predicate(filter);
        builder
    }
}

fn bind_args<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &'q [SqlArg],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            SqlArg::Text(s) => query.bind(s.as_str()),
            SqlArg::Json(v) => query.bind(Json(v)),
            SqlArg::BigInt(n) => query.bind(*n),
        };
    }
    query
}

fn select_sql(collection: &str, filter: &Filter, page: &PageRequest) -> SqlBuilder {
    let where_clause = SqlBuilder::scoped(collection, filter);
    let mut builder = SqlBuilder {
        sql: format!("SELECT doc FROM entity_documents WHERE {}", where_clause.sql),
        args: where_clause.args,
    };
    let direction = if page.asc { "ASC" } else { "DESC" };
    builder
        .push(" ORDER BY doc -> ")
        .bind(SqlArg::Text(page.order.clone()))
        .push(&format!(" {direction}, id ASC LIMIT "))
        .bind(SqlArg::BigInt(i64::from(page.limit())))
        .push(" OFFSET ")
        .bind(SqlArg::BigInt(i64::try_from(page.offset()).unwrap_or(i64::MAX)));
    builder
}

fn count_sql(collection: &str, filter: &Filter) -> SqlBuilder {
    let where_clause = SqlBuilder::scoped(collection, filter);
    SqlBuilder {
        sql: format!("SELECT COUNT(*) FROM entity_documents WHERE {}", where_clause.sql),
        args: where_clause.args,
    }
}

fn map_write_error(err: sqlx::Error, id: EntityId) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return match db.constraint() {
                Some(PRIMARY_KEY) => StoreError::DuplicateId(id),
                Some(name) => StoreError::UniqueViolation(name.to_string()),
                None => StoreError::UniqueViolation(LIVE_CODE_INDEX.to_string()),
            };
        }
    }
    StoreError::Database(err)
}

impl<T: Document> PostgresEntityStore<T> {
    async fn fetch(&self, builder: &SqlBuilder) -> Result<Vec<T>, StoreError> {
        let rows = bind_args(sqlx::query(&builder.sql), &builder.args)
            .fetch_all(&*self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> Result<T, StoreError> {
                let Json(doc) = row.try_get::<Json<JsonValue>, _>("doc")?;
                Ok(serde_json::from_value(doc)?)
            })
            .collect()
    }
}

#[async_trait]
impl<T: Document> EntityStore<T> for PostgresEntityStore<T> {
    async fn query(&self, filter: &Filter, page: &PageRequest) -> Result<Page<T>, StoreError> {
        let count = count_sql(T::COLLECTION, filter);
        let row = bind_args(sqlx::query(&count.sql), &count.args)
            .fetch_one(&*self.pool)
            .await?;
        let total: i64 = row.try_get(0)?;

        let select = select_sql(T::COLLECTION, filter, page);
        debug!(collection = T::COLLECTION, sql = %select.sql, "query documents");
        let data = self.fetch(&select).await?;

        Ok(Page::new(data, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn single_or_default(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let mut builder = SqlBuilder::scoped(T::COLLECTION, filter);
        builder.sql = format!("SELECT doc FROM entity_documents WHERE {} LIMIT 2", builder.sql);

        let mut records = self.fetch(&builder).await?;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            n => Err(StoreError::MultipleMatches(n)),
        }
    }

    async fn insert(&self, mut record: T) -> Result<EntityId, StoreError> {
        let id = match record.id() {
            Some(id) => *id,
            None => {
                let id = EntityId::new();
                record.set_id(id);
                id
            }
        };
        let doc = serde_json::to_value(&record)?;

        sqlx::query("INSERT INTO entity_documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(T::COLLECTION)
            .bind(id.as_uuid())
            .bind(Json(&doc))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_write_error(e, id))?;

        Ok(id)
    }

    async fn replace(&self, record: T) -> Result<EntityId, StoreError> {
        let id = *record.id().ok_or(StoreError::MissingId)?;
        let doc = serde_json::to_value(&record)?;

        let result = sqlx::query(
            "UPDATE entity_documents SET doc = $3 WHERE collection = $1 AND id = $2",
        )
        .bind(T::COLLECTION)
        .bind(id.as_uuid())
        .bind(Json(&doc))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(id)
    }
}

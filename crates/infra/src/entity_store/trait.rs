use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use atelier_core::{Document, EntityId, ID_FIELD};
use std::sync::Arc;

use super::filter::Filter;

/// Entity store operation error.
///
/// These are **infrastructure errors** (connectivity, constraints, malformed
/// documents) as opposed to domain errors (validation). They are surfaced to
/// callers unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A strict single-record lookup matched nothing.
    #[error("record not found")]
    NotFound,

    /// A single-record lookup matched more than one document.
    #[error("expected at most one record, found {0}")]
    MultipleMatches(usize),

    /// A replace was attempted on a record that was never stored.
    #[error("record has no identifier")]
    MissingId,

    /// An insert reused an identifier that is already stored.
    #[error("duplicate identifier: {0}")]
    DuplicateId(EntityId),

    /// A unique index/constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The filter or ordering could not be executed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// One page of a query: 1-based page number, page size, and ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    /// Document field to order by.
    pub order: String,
    pub asc: bool,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, asc: bool) -> Self {
        self.order = field.into();
        self.asc = asc;
        self
    }

    /// Zero-based index of the first record on the page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit())
    }

    /// Page size, never below one.
    pub fn limit(&self) -> u32 {
        self.size.max(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            order: ID_FIELD.to_string(),
            asc: true,
        }
    }
}

/// An ordered page of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub size: u32,
    /// Records on this page.
    pub count: usize,
    /// Records matching the filter across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            count: data.len(),
            data,
            page: request.page.max(1),
            size: request.limit(),
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            count: self.count,
            total: self.total,
        }
    }
}

/// Document collection for one record type.
///
/// ## Semantics
///
/// - `query` returns one ordered page of the documents matching `filter`.
///   Ties on the order field are broken by `_id` so paging is stable.
/// - `single_or_default` resolves to `None` when nothing matches and fails with
///   `MultipleMatches` when the filter is ambiguous; `single` additionally fails
///   with `NotFound` on no match.
/// - `exists` is true when at least one document matches; ambiguity is not
///   an error.
/// - `insert` assigns an identifier when the record has none and returns it.
/// - `replace` overwrites the stored document with the same identifier.
///
/// Implementations apply filters as given; soft-delete visibility is the
/// caller's concern.
#[async_trait]
pub trait EntityStore<T: Document>: Send + Sync {
    async fn query(&self, filter: &Filter, page: &PageRequest) -> Result<Page<T>, StoreError>;

    async fn single_or_default(&self, filter: &Filter) -> Result<Option<T>, StoreError>;

    async fn single(&self, filter: &Filter) -> Result<T, StoreError> {
        self.single_or_default(filter)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn exists(&self, filter: &Filter) -> Result<bool, StoreError> {
        let first = self.query(filter, &PageRequest::new(1, 1)).await?;
        Ok(first.total > 0)
    }

    async fn insert(&self, record: T) -> Result<EntityId, StoreError>;

    async fn replace(&self, record: T) -> Result<EntityId, StoreError>;
}

#[async_trait]
impl<T, S> EntityStore<T> for Arc<S>
where
    T: Document,
    S: EntityStore<T> + ?Sized,
{
    async fn query(&self, filter: &Filter, page: &PageRequest) -> Result<Page<T>, StoreError> {
        (**self).query(filter, page).await
    }

    async fn single_or_default(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        (**self).single_or_default(filter).await
    }

    async fn single(&self, filter: &Filter) -> Result<T, StoreError> {
        (**self).single(filter).await
    }

    async fn exists(&self, filter: &Filter) -> Result<bool, StoreError> {
        (**self).exists(filter).await
    }

    async fn insert(&self, record: T) -> Result<EntityId, StoreError> {
        (**self).insert(record).await
    }

    async fn replace(&self, record: T) -> Result<EntityId, StoreError> {
        (**self).replace(record).await
    }
}

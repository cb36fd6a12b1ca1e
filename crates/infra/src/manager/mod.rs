//! Validated-write managers for article master data.
//!
//! One generic [`EntityManager`] implements paging, id lookup and the
//! validate-then-write flow for any [`ArticleRecord`]; entity-specific rules
//! come from the record type itself. [`BrandManager`] and [`VariantManager`]
//! are the concrete instantiations.
//!
//! ## Write flow
//!
//! ```text
//! input
//!   ↓
//! 1. Build candidate (pure, default-filling)
//!   ↓
//! 2. Look up a live record with the same code and a different id
//!   ↓
//! 3. Evaluate every field rule, accumulating violations
//!   ↓
//! 4. Reject with the full violation map, or finalize + stamp once
//!   ↓
//! 5. insert / replace
//! ```
//!
//! Code uniqueness is read-then-write: two concurrent creates with the same
//! code can both pass step 2. Backends with a unique index (Postgres) reject
//! the second write, which is reported as the same `code` violation.

mod error;
mod paging;

pub use error::ManagerError;
pub use paging::PagingOptions;

use std::marker::PhantomData;

use tracing::{info, instrument, warn};

use atelier_articles::{ArticleBrand, ArticleRecord, ArticleVariant, CODE_EXISTS};
use atelier_core::{Actor, EntityId, FieldErrors, Validated, ValidationError, required};

use crate::config::StoreConfig;
use crate::entity_store::{EntityStore, Filter, Page, StoreError};

/// Role tag recorded in the audit stamp of every accepted write.
pub const AGENT: &str = "manager";


pub type BrandManager<S> = EntityManager<ArticleBrand, S>;
pub type VariantManager<S> = EntityManager<ArticleVariant, S>;

/// CRUD + validation over one article collection, acting as one caller.
///
/// Stateless beyond the store handle and the actor; instances can be used
/// concurrently.
pub struct EntityManager<T, S> {
    store: S,
    actor: Actor,
    max_page_size: u32,
    _record: PhantomData<fn() -> T>,
}

impl<T, S> EntityManager<T, S>
where
    T: ArticleRecord,
    S: EntityStore<T>,
{
    pub fn new(store: S, actor: Actor) -> Self {
        Self {
            store,
            actor,
            max_page_size: StoreConfig::default().max_page_size,
            _record: PhantomData,
        }
    }

    /// Manager whose page-size limit follows the store configuration.
    pub fn from_config(store: S, actor: Actor, config: &StoreConfig) -> Self {
        Self::new(store, actor).with_max_page_size(config.max_page_size)
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One ordered page of live records, optionally narrowed by keyword.
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    pub async fn read(&self, paging: PagingOptions) -> Result<Page<T>, ManagerError> {
        let filter = paging.filter();
        let request = paging.page_request(self.max_page_size);
        Ok(self.store.query(&filter, &request).await?)
    }

    /// Strict lookup among live records: an unknown id is `NotFound`.
    ///
    /// The empty id resolves to `Ok(None)` without touching the store.
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    pub async fn get_by_id(&self, id: &str) -> Result<Option<T>, ManagerError> {
        let Some(filter) = Self::id_filter(id)? else {
            return Ok(None);
        };
        match self.store.single(&filter).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound) => Err(ManagerError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Lenient lookup among live records: an unknown id is `Ok(None)`.
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    pub async fn get_by_id_or_default(&self, id: &str) -> Result<Option<T>, ManagerError> {
        let Some(filter) = Self::id_filter(id)? else {
            return Ok(None);
        };
        Ok(self.store.single_or_default(&filter).await?)
    }

    /// Validate and insert; returns the assigned id.
    #[instrument(skip(self, record), fields(collection = T::COLLECTION))]
    pub async fn create(&self, record: T) -> Result<EntityId, ManagerError> {
        let valid = self.validate(record).await??;
        let id = self
            .store
            .insert(valid)
            .await
            .map_err(Self::write_error)?;
        info!(%id, "record created");
        Ok(id)
    }

    /// Validate and replace the stored record with the same id.
    #[instrument(skip(self, record), fields(collection = T::COLLECTION))]
    pub async fn update(&self, record: T) -> Result<EntityId, ManagerError> {
        let valid = self.validate(record).await??;
        let id = self
            .store
            .replace(valid)
            .await
            .map_err(Self::write_error)?;
        info!(%id, "record updated");
        Ok(id)
    }

    /// Validate, flag as deleted, and replace. Records are never removed.
    #[instrument(skip(self, record), fields(collection = T::COLLECTION))]
    pub async fn delete(&self, record: T) -> Result<EntityId, ManagerError> {
        let mut valid = self.validate(record).await??;
        valid.mark_deleted();
        let id = self
            .store
            .replace(valid)
            .await
            .map_err(Self::write_error)?;
        info!(%id, "record deleted");
        Ok(id)
    }

    /// Run every rule against the candidate built from `input`.
    ///
    /// The outer `Result` carries store failures from the uniqueness lookup;
    /// the inner one is the validation outcome. An accepted candidate is
    /// finalized and stamped exactly once; a rejected one is never stamped.
    #[instrument(skip(self, input), fields(collection = T::COLLECTION))]
    pub async fn validate(&self, input: T) -> Result<Validated<T>, StoreError> {
        let mut candidate = T::candidate(input);
        let conflict = self.store.exists(&Self::conflict_filter(&candidate)).await?;

        let mut errors = FieldErrors::new();
        if let Some(message) = required("code", candidate.code()) {
            errors.insert("code", message);
        } else if conflict {
            errors.insert("code", CODE_EXISTS);
        }
        T::rules().evaluate_into(&candidate, &mut errors);

        if !errors.is_empty() {
            warn!(violations = ?errors, "candidate rejected");
            return Ok(errors.into_result(candidate));
        }

        candidate.finalize();
        candidate.stamp(&self.actor, AGENT);
        Ok(Ok(candidate))
    }

    /// Another live record using the candidate's code.
    fn conflict_filter(candidate: &T) -> Filter {
        let filter = Filter::eq("code", candidate.code()).and(Filter::not_deleted());
        match candidate.id() {
            Some(id) => filter.and(Filter::id_ne(*id)),
            None => filter,
        }
    }

    fn id_filter(id: &str) -> Result<Option<Filter>, ManagerError> {
        if id.is_empty() {
            // Callers rely on the empty id resolving to nothing rather than failing.
            warn!("lookup with empty id resolved to none");
            return Ok(None);
        }
        let id: EntityId = id.parse()?;
        Ok(Some(Filter::id_eq(id).and(Filter::not_deleted())))
    }

    fn write_error(err: StoreError) -> ManagerError {
        match err {
            StoreError::UniqueViolation(constraint) => {
                warn!(%constraint, "write rejected by unique index");
                ValidationError::single("code", CODE_EXISTS).into()
            }
            other => other.into(),
        }
    }
}

#[cfg(test)]
mod tests;

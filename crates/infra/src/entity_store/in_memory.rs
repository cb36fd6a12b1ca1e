use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use atelier_core::{Document, EntityId, ID_FIELD};

use super::filter::{Filter, compare_json};
use super::r#trait::{EntityStore, Page, PageRequest, StoreError};

/// In-memory document collection.
///
/// Records are kept as serialized JSON documents, so filters and ordering see
/// exactly the field names a document database would. Intended for tests/dev.
/// It has no unique index: code uniqueness is only as strong as the caller's
/// read-then-write check.
#[derive(Debug)]
pub struct InMemoryEntityStore<T> {
    docs: RwLock<BTreeMap<EntityId, JsonValue>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> InMemoryEntityStore<T> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            _record: PhantomData,
        }
    }

    /// Number of stored documents, deleted ones included.
    pub fn len(&self) -> Result<usize, StoreError> {
        let docs = self.docs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl<T> Default for InMemoryEntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> InMemoryEntityStore<T> {
    fn matching(&self, filter: &Filter) -> Result<Vec<JsonValue>, StoreError> {
        let compiled = filter.compile()?;
        let docs = self.docs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs
            .values()
            .filter(|doc| compiled.matches(doc))
            .cloned()
            .collect())
    }

    fn decode(doc: JsonValue) -> Result<T, StoreError> {
        Ok(serde_json::from_value(doc)?)
    }
}

#[async_trait]
impl<T: Document> EntityStore<T> for InMemoryEntityStore<T> {
    async fn query(&self, filter: &Filter, page: &PageRequest) -> Result<Page<T>, StoreError> {
        let mut docs = self.matching(filter)?;

        docs.sort_by(|a, b| {
            let primary = compare_json(a.get(&page.order), b.get(&page.order));
            let primary = if page.asc { primary } else { primary.reverse() };
            primary.then_with(|| compare_json(a.get(ID_FIELD), b.get(ID_FIELD)))
        });

        let total = docs.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let data = docs
            .into_iter()
            .skip(offset)
            .take(page.limit() as usize)
            .map(Self::decode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(data, page, total))
    }

    async fn single_or_default(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let mut docs = self.matching(filter)?;
        match docs.len() {
            0 => Ok(None),
            1 => Self::decode(docs.remove(0)).map(Some),
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

        let mut docs = self.docs.write().map_err(|_| StoreError::Poisoned)?;
        if docs.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        docs.insert(id, doc);
        Ok(id)
    }

    async fn replace(&self, record: T) -> Result<EntityId, StoreError> {
        let id = *record.id().ok_or(StoreError::MissingId)?;
        let doc = serde_json::to_value(&record)?;

        let mut docs = self.docs.write().map_err(|_| StoreError::Poisoned)?;
        match docs.get_mut(&id) {
            Some(slot) => {
                *slot = doc;
                Ok(id)
            }
            None => Err(StoreError::NotFound),
        }
    }
}

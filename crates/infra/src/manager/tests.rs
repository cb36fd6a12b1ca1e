use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use atelier_articles::{ArticleBrand, ArticleVariant, PriceValue};
use atelier_core::{Actor, Document, EntityId};

use super::*;
use crate::config::StoreConfig;
use crate::entity_store::{InMemoryEntityStore, PageRequest};

fn actor() -> Actor {
    Actor::new("tester")
}

fn brands() -> BrandManager<Arc<InMemoryEntityStore<ArticleBrand>>> {
    BrandManager::new(Arc::new(InMemoryEntityStore::new()), actor())
}

fn variants() -> VariantManager<Arc<InMemoryEntityStore<ArticleVariant>>> {
    VariantManager::new(Arc::new(InMemoryEntityStore::new()), actor())
}

fn variant(code: &str) -> ArticleVariant {
    ArticleVariant::new(code, "Batik Shirt", "M").with_uniform_price("5")
}

fn field_error(err: &ManagerError, field: &str) -> Option<String> {
    err.validation_errors()
        .and_then(|errors| errors.get(field))
        .map(str::to_string)
}

#[tokio::test]
async fn create_stamps_and_returns_the_new_id() {
    let manager = brands();
    let id = manager.create(ArticleBrand::new("BR1", "Acme")).await.unwrap();

    let stored = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
    assert_eq!(stored.id, Some(id));
    assert_eq!(stored.stamp.created_by, "tester");
    assert_eq!(stored.stamp.created_agent, AGENT);
    assert_eq!(stored.stamp.updated_by, "tester");
    assert!(!stored.deleted);
}

#[tokio::test]
async fn empty_code_and_name_are_reported_together() {
    let manager = brands();
    let err = manager.create(ArticleBrand::default()).await.unwrap_err();

    assert_eq!(field_error(&err, "code").as_deref(), Some("code is required"));
    assert_eq!(field_error(&err, "name").as_deref(), Some("name is required"));
    assert_eq!(err.validation_errors().unwrap().len(), 2);
    assert!(manager.store().is_empty().unwrap());
}

#[tokio::test]
async fn duplicate_code_is_rejected_on_create() {
    let manager = brands();
    manager.create(ArticleBrand::new("BR1", "Acme")).await.unwrap();

    let err = manager
        .create(ArticleBrand::new("BR1", "Other"))
        .await
        .unwrap_err();
    assert_eq!(field_error(&err, "code").as_deref(), Some(CODE_EXISTS));
    assert_eq!(err.validation_errors().unwrap().len(), 1);
}

#[tokio::test]
async fn code_shared_by_two_live_records_still_reads_as_a_conflict() {
    let manager = brands();
    // Two live records with one code, as a lost read-then-write race leaves them.
    manager.store().insert(ArticleBrand::new("BR1", "Acme")).await.unwrap();
    manager.store().insert(ArticleBrand::new("BR1", "Acme Again")).await.unwrap();

    let err = manager
        .create(ArticleBrand::new("BR1", "Third"))
        .await
        .unwrap_err();
    assert_eq!(field_error(&err, "code").as_deref(), Some(CODE_EXISTS));
    assert_eq!(manager.store().len().unwrap(), 2);
}

#[tokio::test]
async fn page_size_limit_comes_from_the_store_config() {
    let config = StoreConfig {
        max_page_size: 2,
        ..StoreConfig::default()
    };
    let manager = BrandManager::from_config(
        Arc::new(InMemoryEntityStore::new()),
        actor(),
        &config,
    );
    for code in ["A", "B", "C"] {
        manager.create(ArticleBrand::new(code, "Acme")).await.unwrap();
    }

    let page = manager
        .read(PagingOptions::default().page(1, 50))
        .await
        .unwrap();
    assert_eq!(page.size, 2);
    assert_eq!(page.count, 2);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn update_keeps_its_own_code() {
    let manager = brands();
    let id = manager.create(ArticleBrand::new("BR1", "Acme")).await.unwrap();

    let mut brand = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
    brand.name = "Acme Textiles".into();
    assert_eq!(manager.update(brand).await.unwrap(), id);

    let stored = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
    assert_eq!(stored.name, "Acme Textiles");
    assert_eq!(stored.stamp.created_by, "tester");
}

#[tokio::test]
async fn update_to_another_records_code_is_rejected() {
    let manager = brands();
    manager.create(ArticleBrand::new("BR1", "Acme")).await.unwrap();
    let id = manager.create(ArticleBrand::new("BR2", "Other")).await.unwrap();

    let mut brand = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
    brand.code = "BR1".into();
    let err = manager.update(brand).await.unwrap_err();
    assert_eq!(field_error(&err, "code").as_deref(), Some(CODE_EXISTS));
}

#[tokio::test]
async fn deleted_codes_can_be_reused() {
    let manager = brands();
    let id = manager.create(ArticleBrand::new("BR1", "Acme")).await.unwrap();
    let brand = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
    manager.delete(brand).await.unwrap();

    manager.create(ArticleBrand::new("BR1", "Acme II")).await.unwrap();
}

#[tokio::test]
async fn update_of_unknown_record_surfaces_the_store_error() {
    let manager = brands();
    let err = manager
        .update(ArticleBrand::new("BR1", "Acme").with_id(EntityId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Store(StoreError::NotFound)));
}

#[tokio::test]
async fn delete_requires_a_valid_record() {
    let manager = brands();
    let id = manager.create(ArticleBrand::new("BR1", "Acme")).await.unwrap();
    let mut brand = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
    brand.name.clear();

    let err = manager.delete(brand).await.unwrap_err();
    assert_eq!(field_error(&err, "name").as_deref(), Some("name is required"));
    assert!(manager.get_by_id(&id.to_string()).await.unwrap().is_some());
}

#[tokio::test]
async fn deleted_records_disappear_from_reads_and_lookups() {
    let manager = brands();
    let id = manager.create(ArticleBrand::new("BR1", "Acme")).await.unwrap();
    manager.create(ArticleBrand::new("BR2", "Other")).await.unwrap();

    let brand = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
    assert_eq!(manager.delete(brand).await.unwrap(), id);

    let page = manager.read(PagingOptions::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].code, "BR2");

    assert!(matches!(
        manager.get_by_id(&id.to_string()).await,
        Err(ManagerError::NotFound)
    ));
    assert!(manager.get_by_id_or_default(&id.to_string()).await.unwrap().is_none());
    assert_eq!(manager.store().len().unwrap(), 2);
}

#[tokio::test]
async fn empty_id_resolves_to_none() {
    let manager = brands();
    assert!(manager.get_by_id("").await.unwrap().is_none());
    assert!(manager.get_by_id_or_default("").await.unwrap().is_none());

    let variants = variants();
    assert!(variants.get_by_id("").await.unwrap().is_none());
    assert!(variants.get_by_id_or_default("").await.unwrap().is_none());
}

#[tokio::test]
async fn strict_and_lenient_lookups_differ_on_unknown_ids() {
    let manager = brands();
    let unknown = EntityId::new().to_string();
    assert!(matches!(
        manager.get_by_id(&unknown).await,
        Err(ManagerError::NotFound)
    ));
    assert!(manager.get_by_id_or_default(&unknown).await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let manager = brands();
    assert!(matches!(
        manager.get_by_id("xyz").await,
        Err(ManagerError::InvalidId(_))
    ));
    assert!(matches!(
        manager.get_by_id_or_default("xyz").await,
        Err(ManagerError::InvalidId(_))
    ));
}

#[tokio::test]
async fn read_filters_by_keyword_on_code_or_name() {
    let manager = brands();
    manager.create(ArticleBrand::new("BR-ACME", "Acme")).await.unwrap();
    manager.create(ArticleBrand::new("BR-2", "Batik Acme")).await.unwrap();
    manager.create(ArticleBrand::new("BR-3", "Other")).await.unwrap();

    let page = manager
        .read(PagingOptions::default().keyword("ACME").order_by("code", true))
        .await
        .unwrap();
    let codes: Vec<_> = page.data.iter().map(|b| b.code.as_str()).collect();
    assert_eq!(codes, ["BR-2", "BR-ACME"]);
}

#[tokio::test]
async fn read_pages_with_clamped_size() {
    let manager = brands().with_max_page_size(2);
    for code in ["A", "B", "C"] {
        manager.create(ArticleBrand::new(code, code)).await.unwrap();
    }

    let page = manager
        .read(PagingOptions::default().page(2, 50).order_by("code", true))
        .await
        .unwrap();
    assert_eq!(page.size, 2);
    assert_eq!(page.total, 3);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].code, "C");
}

#[tokio::test]
async fn variant_prices_must_be_present_and_non_negative() {
    let manager = variants();

    let mut negative = variant("VR1");
    negative.domestic_cogs = Some("-1".into());
    let err = manager.create(negative).await.unwrap_err();
    assert_eq!(
        field_error(&err, "domesticCOGS").as_deref(),
        Some("domesticCOGS must be greater with 0")
    );

    let mut blank = variant("VR1");
    blank.international_sale = Some("".into());
    blank.size.clear();
    let err = manager.create(blank).await.unwrap_err();
    assert_eq!(
        field_error(&err, "internationalSale").as_deref(),
        Some("internationalSale is required")
    );
    assert_eq!(field_error(&err, "size").as_deref(), Some("size is required"));

    for price in ["0", "5"] {
        let id = manager
            .create(ArticleVariant::new(format!("VR-{price}"), "Shirt", "L").with_uniform_price(price))
            .await
            .unwrap();
        let stored = manager.get_by_id(&id.to_string()).await.unwrap().unwrap();
        let expected: i64 = price.parse().unwrap();
        assert_eq!(stored.domestic_sale, Some(PriceValue::Integer(expected)));
    }
}

/// Store that counts lookups and can be told to fail or to report a unique violation.
#[derive(Default)]
struct ScriptedStore {
    inner: InMemoryEntityStore<ArticleBrand>,
    lookups: AtomicUsize,
    fail_lookups: bool,
    unique_violation_on_write: bool,
}

#[async_trait]
impl EntityStore<ArticleBrand> for ScriptedStore {
    async fn query(
        &self,
        filter: &Filter,
        page: &PageRequest,
    ) -> Result<Page<ArticleBrand>, StoreError> {
        self.inner.query(filter, page).await
    }

    async fn single_or_default(&self, filter: &Filter) -> Result<Option<ArticleBrand>, StoreError> {
        self.inner.single_or_default(filter).await
    }

    async fn exists(&self, filter: &Filter) -> Result<bool, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups {
            return Err(StoreError::InvalidQuery("connection reset".into()));
        }
        self.inner.exists(filter).await
    }

    async fn insert(&self, record: ArticleBrand) -> Result<EntityId, StoreError> {
        if self.unique_violation_on_write {
            return Err(StoreError::UniqueViolation("entity_documents_live_code".into()));
        }
        self.inner.insert(record).await
    }

    async fn replace(&self, record: ArticleBrand) -> Result<EntityId, StoreError> {
        self.inner.replace(record).await
    }
}

#[tokio::test]
async fn validate_reads_the_store_once_and_stamps_only_accepted_candidates() {
    let manager = BrandManager::new(ScriptedStore::default(), actor());

    let rejected = manager.validate(ArticleBrand::new("BR1", "")).await.unwrap();
    assert!(rejected.is_err());
    assert_eq!(manager.store().lookups.load(Ordering::SeqCst), 1);

    let accepted = manager
        .validate(ArticleBrand::new("BR1", "Acme"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(manager.store().lookups.load(Ordering::SeqCst), 2);
    assert!(accepted.stamp.is_stamped());
    assert_eq!(accepted.stamp.updated_agent, AGENT);
}

#[tokio::test]
async fn validation_does_not_stamp_the_rejected_candidate() {
    let manager = brands();
    let err = manager
        .validate(ArticleBrand::new("", "Acme"))
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(err.errors().get("code"), Some("code is required"));
}

#[tokio::test]
async fn store_failures_propagate_unchanged() {
    let store = ScriptedStore {
        fail_lookups: true,
        ..ScriptedStore::default()
    };
    let manager = BrandManager::new(store, actor());

    let err = manager
        .create(ArticleBrand::new("BR1", "Acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Store(StoreError::InvalidQuery(_))));
    assert!(manager.store().inner.is_empty().unwrap());
}

#[tokio::test]
async fn unique_index_violation_reads_as_a_code_conflict() {
    let store = ScriptedStore {
        unique_violation_on_write: true,
        ..ScriptedStore::default()
    };
    let manager = BrandManager::new(store, actor());

    let err = manager
        .create(ArticleBrand::new("BR1", "Acme"))
        .await
        .unwrap_err();
    assert_eq!(field_error(&err, "code").as_deref(), Some(CODE_EXISTS));
}

#[test]
fn conflict_filter_excludes_own_id_and_deleted_records() {
    let id = EntityId::new();
    let filter = BrandManager::<Arc<InMemoryEntityStore<ArticleBrand>>>::conflict_filter(
        &ArticleBrand::new("BR1", "Acme").with_id(id),
    );
    assert_eq!(
        filter,
        Filter::And(vec![
            Filter::eq("code", "BR1"),
            Filter::not_deleted(),
            Filter::id_ne(id),
        ])
    );
    assert_eq!(ArticleBrand::COLLECTION, "core.article.ArticleBrand");
}

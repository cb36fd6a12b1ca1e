//! Infrastructure layer: document stores, configuration, and the validated-write
//! managers that compose them with the article domain.

pub mod config;
pub mod entity_store;
pub mod manager;


pub use config::{ConfigError, StoreBackend, StoreConfig};
pub use entity_store::{
    EntityStore, Filter, InMemoryEntityStore, Page, PageRequest, PostgresEntityStore, StoreError,
};
pub use manager::{BrandManager, EntityManager, ManagerError, PagingOptions, VariantManager};

//! Article master-data module (brands, variants).
//!
//! Record shapes and their field rules, implemented purely as deterministic
//! domain logic (no IO, no storage). Persistence and the validated-write flow
//! live in `atelier-infra`.

pub mod brand;
pub mod price;
pub mod record;
pub mod variant;

pub use brand::ArticleBrand;
pub use price::{PriceError, PriceValue, check_price};
pub use record::{ArticleRecord, CODE_EXISTS, base_rules};
pub use variant::ArticleVariant;

//! `atelier-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod audit;
pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use audit::{Actor, Stamp, Stamped};
pub use entity::{DELETED_FIELD, Document, Entity, ID_FIELD, SoftDelete};
pub use error::{DomainError, DomainResult};
pub use id::EntityId;
pub use validation::{
    FieldCheck, FieldErrors, RuleSet, VALIDATION_FAILED, Validated, ValidationError, required,
    required_message,
};

use thiserror::Error;

use atelier_core::{DomainError, ValidationError};

use crate::entity_store::StoreError;

/// Failure of a manager operation.
///
/// Store failures are carried unchanged; the manager never retries or recovers.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The candidate failed validation; carries every violated field.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Strict lookup found no live record with the given id.
    #[error("not found")]
    NotFound,

    /// The id could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for ManagerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(err) => ManagerError::Validation(err),
            DomainError::InvalidId(msg) => ManagerError::InvalidId(msg),
            DomainError::NotFound => ManagerError::NotFound,
        }
    }
}

impl ManagerError {
    pub fn validation_errors(&self) -> Option<&atelier_core::FieldErrors> {
        match self {
            ManagerError::Validation(err) => Some(err.errors()),
            _ => None,
        }
    }
}

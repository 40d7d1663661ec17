//! Domain error model.

use thiserror::Error;

use crate::entity::EntityKind;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// natural-key collisions, missing records). Storage failures belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed validation; `field` names the offending input.
    #[error("validation failed on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    /// A natural key (sku, location code) is already taken.
    #[error("{kind} with key '{key}' already exists")]
    DuplicateKey { kind: EntityKind, key: String },

    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The operation conflicts with existing records (e.g. a restricted delete).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn duplicate_key(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            kind,
            key: key.into(),
        }
    }

    pub fn not_found(kind: EntityKind, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Field name for validation failures, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DomainError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_input() {
        let err = DomainError::validation("qty", "quantity must be non-zero");
        assert_eq!(err.to_string(), "validation failed on `qty`: quantity must be non-zero");
        assert_eq!(err.field(), Some("qty"));

        let err = DomainError::duplicate_key(EntityKind::Product, "PROD-A");
        assert_eq!(err.to_string(), "product with key 'PROD-A' already exists");
        assert_eq!(err.field(), None);
    }
}

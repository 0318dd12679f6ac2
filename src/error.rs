//! Error types for reactive models.

use thiserror::Error;

/// Main error type for model operations.
///
/// Every variant is a programmer error surfaced synchronously; nothing is
/// retried or recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Model source must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("Model is already transformed")]
    AlreadyTransformed,

    #[error("Field is already proxied: {0}")]
    AlreadyProxied(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field holds a method and cannot be tracked: {0}")]
    CallableField(String),

    #[error("Field is not a method: {0}")]
    NotAMethod(String),

    #[error("Field name is reserved for the state stream: {0}")]
    ReservedField(String),

    #[error("Model is frozen, cannot {op} field {field}")]
    Frozen { op: &'static str, field: String },

    #[error("Expected {expected} field values, got {got}")]
    ValueCount { expected: usize, got: usize },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

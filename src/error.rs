//! Error types for the storefront directory.
//!
//! Validation failures carry field-level detail so callers can report exactly which
//! input was rejected; storage failures are kept opaque.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::store::StoreId;

/// A single rejected field on a write payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Returned when a write payload is missing required fields or has malformed values.
/// Nothing is persisted when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Names of the offending fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The unique constraint on `slug` rejected the write.
    #[error("slug '{slug}' is already taken")]
    SlugTaken { slug: String },

    #[error("store {0} not found")]
    StoreNotFound(StoreId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the store record manager.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store not found: {0}")]
    NotFound(String),

    #[error("could not assign a unique slug for '{base}' after {attempts} attempts")]
    SlugExhausted { base: String, attempts: u32 },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::StoreNotFound(id) => StoreError::NotFound(id.to_string()),
            other => StoreError::Storage(other),
        }
    }
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

//! Error types for pgfulltext.
//!
//! Validation errors are raised before any statement is built. Errors coming
//! back from the host engine are wrapped without reinterpretation so callers
//! see the engine's own message.

use thiserror::Error;

/// Main error type for the pgfulltext library.
#[derive(Debug, Error)]
pub enum FullTextError {
    // Declaration errors
    #[error("The following fields do not exist in {table}: {}", .fields.join(", "))]
    UnknownField { table: String, fields: Vec<String> },

    #[error("No searchable text columns found in {table}")]
    NoSearchableFields { table: String },

    #[error("Search field is not specified for {table}")]
    MissingSearchField { table: String },

    #[error("Table {table} has no primary key column")]
    MissingPrimaryKey { table: String },

    #[error("Entity not found: {name}")]
    EntityNotFound { name: String },

    // Lookup errors
    #[error("Full-text lookup requires at least one search term")]
    EmptyTerms,

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Host engine errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("Statement execution failed: {message}")]
    Execution { message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for pgfulltext operations.
pub type Result<T> = std::result::Result<T, FullTextError>;

impl From<rusqlite::Error> for FullTextError {
    fn from(err: rusqlite::Error) -> Self {
        FullTextError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for FullTextError {
    fn from(err: serde_json::Error) -> Self {
        FullTextError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl FullTextError {
    /// Create a validation error for a named input.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FullTextError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors raised before anything reached the host engine.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FullTextError::UnknownField { .. }
                | FullTextError::NoSearchableFields { .. }
                | FullTextError::MissingSearchField { .. }
                | FullTextError::MissingPrimaryKey { .. }
                | FullTextError::EntityNotFound { .. }
                | FullTextError::EmptyTerms
                | FullTextError::Validation { .. }
        )
    }
}

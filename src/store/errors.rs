//! # Store Errors

use thiserror::Error;

use crate::codec::CodecError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    // Optimistic concurrency
    #[error("Document update conflict: {0}")]
    Conflict(String),

    // Lookup errors
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    // Setup errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // Collaborator failures
    #[error("Document client error: {0}")]
    Client(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Conflict(_) => "COUCHMAP_STORE_CONFLICT",
            StoreError::NotFound(_) => "COUCHMAP_STORE_NOT_FOUND",
            StoreError::DatabaseNotFound(_) => "COUCHMAP_STORE_DATABASE_NOT_FOUND",
            StoreError::Config(_) => "COUCHMAP_STORE_CONFIG",
            StoreError::Client(_) => "COUCHMAP_STORE_CLIENT",
            StoreError::Codec(e) => e.code(),
        }
    }

    /// Whether the store rejected a write against a stale revision
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    /// Whether the target document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

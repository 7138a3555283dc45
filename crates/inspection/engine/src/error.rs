//! Error types for the inspection engine

use inspection_policy::PolicyError;
use thiserror::Error;

/// Engine-level errors
///
/// Every failed operation maps to exactly one of these; nothing is silently
/// skipped.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller's role or ownership does not allow the operation
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Operation conflicts with the current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Evidence blob store failure
    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => EngineError::NotFound(msg),
            StorageError::Conflict(msg) => EngineError::Conflict(msg),
            other => EngineError::Storage(other),
        }
    }
}

impl From<PolicyError> for EngineError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Denied { reason } => EngineError::Authorization(reason),
        }
    }
}

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (e.g., duplicate key, referenced row)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid data read back from the backend
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error
    #[error("Query error: {0}")]
    Query(String),
}

/// Blob store errors
#[derive(Debug, Error)]
pub enum BlobError {
    /// Path escapes the store root or is otherwise unusable
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

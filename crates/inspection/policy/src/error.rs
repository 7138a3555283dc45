//! Error types for access checks

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access check errors
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyError {
    /// Operation denied by the role gate or ownership rule
    #[error("access denied: {reason}")]
    Denied { reason: String },
}

/// Result type for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

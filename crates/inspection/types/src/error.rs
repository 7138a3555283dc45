//! Parse errors for the closed enumerations in this crate

use thiserror::Error;

/// Errors raised when parsing identifiers or enumerations from text
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier '{value}' for {kind}")]
    InvalidId { kind: &'static str, value: String },

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("unknown inspection status '{0}'")]
    UnknownStatus(String),

    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),
}

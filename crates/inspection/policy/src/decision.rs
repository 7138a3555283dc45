//! Policy decision types

use inspection_types::Role;
use serde::{Deserialize, Serialize};

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyDecision {
    /// Operation is allowed
    Allow,

    /// Operation is denied
    Deny {
        /// Reason for denial
        reason: String,
        /// Minimum role that would have been allowed, if any
        required: Option<Role>,
    },
}

impl PolicyDecision {
    /// Create an allow decision
    pub fn allow() -> Self {
        Self::Allow
    }

    /// Create a deny decision
    pub fn deny(reason: impl Into<String>, required: Option<Role>) -> Self {
        Self::Deny {
            reason: reason.into(),
            required,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }
}

//! Role hierarchy
//!
//! Roles form a strict total order, `Inspector < Supervisor < Admin`, so a
//! requirement of `Supervisor` is satisfied by `Supervisor` or `Admin`.

use crate::error::TypeError;
use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role
///
/// Variant order defines the hierarchy; `Ord` is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Inspector,
    Supervisor,
    Admin,
}

impl Role {
    /// All roles, lowest first
    pub const ALL: [Role; 3] = [Role::Inspector, Role::Supervisor, Role::Admin];

    /// Does this role meet a minimum role requirement?
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }

    /// Can this role decide (approve or reject) inspections?
    pub fn can_review(self) -> bool {
        self.satisfies(Role::Supervisor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Inspector => "inspector",
            Role::Supervisor => "supervisor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inspector" => Ok(Role::Inspector),
            "supervisor" => Ok(Role::Supervisor),
            "admin" => Ok(Role::Admin),
            other => Err(TypeError::UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated principal performing an operation
///
/// The role always comes from the user catalog, never from request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Inspectors only own their own records; reviewers see everything.
    pub fn owns(&self, inspector_id: &UserId) -> bool {
        self.role.can_review() || &self.user_id == inspector_id
    }
}

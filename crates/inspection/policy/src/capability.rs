//! Static capability table
//!
//! | Module         | read       | create     | update     | delete     | transition | export |
//! |----------------|------------|------------|------------|------------|------------|--------|
//! | inspections    | inspector  | inspector  | inspector  | admin      | supervisor | admin  |
//! | evidence       | inspector  | inspector  |            | supervisor |            |        |
//! | signatures     | inspector  | inspector  |            |            |            |        |
//! | reports        | inspector  |            |            |            |            | admin  |
//! | plants         | inspector  | supervisor | supervisor | supervisor |            |        |
//! | shipping_lines | inspector  | supervisor | supervisor | supervisor |            |        |
//! | users          | admin      | admin      | admin      | admin      |            |        |
//! | audit          | admin      |            |            |            |            |        |

use inspection_types::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Functional area of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Inspections,
    Evidence,
    Signatures,
    Reports,
    Plants,
    ShippingLines,
    Users,
    Audit,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Inspections,
        Module::Evidence,
        Module::Signatures,
        Module::Reports,
        Module::Plants,
        Module::ShippingLines,
        Module::Users,
        Module::Audit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::Inspections => "inspections",
            Module::Evidence => "evidence",
            Module::Signatures => "signatures",
            Module::Reports => "reports",
            Module::Plants => "plants",
            Module::ShippingLines => "shipping_lines",
            Module::Users => "users",
            Module::Audit => "audit",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or(())
    }
}

/// Operation kind within a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Transition,
    Export,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Transition,
        Action::Export,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Transition => "transition",
            Action::Export => "export",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or(())
    }
}

/// Minimum role for `(module, action)`, or `None` if nobody may do it
pub fn required_role(module: Module, action: Action) -> Option<Role> {
    use Action::*;
    use Module::*;

    match (module, action) {
        (Inspections, Read | Create | Update) => Some(Role::Inspector),
        (Inspections, Transition) => Some(Role::Supervisor),
        (Inspections, Delete | Export) => Some(Role::Admin),

        (Evidence, Read | Create) => Some(Role::Inspector),
        (Evidence, Delete) => Some(Role::Supervisor),

        (Signatures, Read | Create) => Some(Role::Inspector),

        (Reports, Read) => Some(Role::Inspector),
        (Reports, Export) => Some(Role::Admin),

        (Plants | ShippingLines, Read) => Some(Role::Inspector),
        (Plants | ShippingLines, Create | Update | Delete) => Some(Role::Supervisor),

        (Users, Read | Create | Update | Delete) => Some(Role::Admin),

        (Audit, Read) => Some(Role::Admin),

        _ => None,
    }
}

/// Pure permission check against the capability table
pub fn has_permission(role: Role, module: Module, action: Action) -> bool {
    required_role(module, action).is_some_and(|required| role.satisfies(required))
}

/// String form of [`has_permission`]; any unknown name denies
pub fn has_permission_str(role: &str, module: &str, action: &str) -> bool {
    let (Ok(role), Ok(module), Ok(action)) = (
        role.parse::<Role>(),
        module.parse::<Module>(),
        action.parse::<Action>(),
    ) else {
        return false;
    };
    has_permission(role, module, action)
}

//! # Inspection Policy
//!
//! Authorization for the container inspection service.
//!
//! Authorization is two-layered:
//!
//! 1. A static capability table maps every `(module, action)` pair to the
//!    minimum [`Role`](inspection_types::Role) allowed to perform it. Pairs
//!    absent from the table are denied.
//! 2. Ownership: inspectors only touch inspections they performed
//!    ([`Caller::owns`](inspection_types::Caller::owns)).
//!
//! [`AccessGate`] combines both and produces [`PolicyError::Denied`] with a
//! reason naming the required role.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod capability;
pub mod decision;
pub mod error;
pub mod gate;

pub use capability::{has_permission, has_permission_str, required_role, Action, Module};
pub use decision::PolicyDecision;
pub use error::{PolicyError, Result};
pub use gate::AccessGate;

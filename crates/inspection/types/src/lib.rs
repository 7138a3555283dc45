//! # Inspection Types
//!
//! Core types shared by every crate of the container inspection service:
//!
//! - Strongly-typed identifiers ([`InspectionId`], [`PhotoId`], ...)
//! - The [`Role`] hierarchy used by the authorization gate
//! - The closed [`InspectionStatus`] state set and its transition rules
//! - Entities: [`Inspection`], [`Photo`], [`Plant`], [`ShippingLine`], [`User`]
//! - Lifecycle events broadcast to watchers ([`InspectionEventEnvelope`])

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod catalog;
pub mod error;
pub mod events;
pub mod evidence;
pub mod ids;
pub mod inspection;
pub mod role;
pub mod status;

pub use catalog::{Plant, ShippingLine, User, UserStatus};
pub use error::TypeError;
pub use events::{InspectionEvent, InspectionEventEnvelope};
pub use evidence::{ContentHash, MediaType, Photo};
pub use ids::{InspectionId, PhotoId, PlantId, ShippingLineId, UserId};
pub use inspection::{
    Decision, EvidenceMutability, Inspection, InspectionCode, InspectionDetail,
    MAX_COMMENT_LEN, MAX_CONTAINER_LEN, TEMPERATURE_RANGE,
};
pub use role::{Caller, Role};
pub use status::{DecisionTarget, InspectionStatus};

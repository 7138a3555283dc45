//! Strongly-typed identifiers for inspection entities
//!
//! All IDs are UUID-based but wrapped in newtype structs for type safety.
//! `Display` renders a short kind prefix (`insp:<uuid>`); parsing accepts the
//! value with or without that prefix.

use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Display prefix for this identifier kind
            pub const PREFIX: &'static str = $prefix;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .strip_prefix(concat!($prefix, ":"))
                    .unwrap_or(s);
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| TypeError::InvalidId {
                        kind: $prefix,
                        value: s.to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an inspection
    InspectionId,
    "insp"
);

uuid_id!(
    /// Unique identifier for an evidence photo
    PhotoId,
    "photo"
);

uuid_id!(
    /// Unique identifier for a plant
    PlantId,
    "plant"
);

uuid_id!(
    /// Unique identifier for a shipping line
    ShippingLineId,
    "line"
);

uuid_id!(
    /// Unique identifier for a user account
    UserId,
    "user"
);

//! Storage layer for the inspection engine
//!
//! The in-memory backend lives here; the daemon provides PostgreSQL.

mod memory;
mod traits;

pub use memory::InMemoryStorage;
pub use traits::{
    EventStorage, EvidenceStorage, Guarded, InspectionStorage, PlantStorage, ShippingLineStorage,
    Storage, UserPatch, UserStorage,
};

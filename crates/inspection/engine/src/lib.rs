//! # Inspection Engine
//!
//! Lifecycle engine for container inspections. Owns the state machine, the
//! evidence lock, reference catalogs and the storage abstractions both
//! backends implement.
//!
//! ## Evidence lock
//!
//! | Status   | attach evidence | delete evidence | transition |
//! |----------|-----------------|-----------------|------------|
//! | pending  | yes             | yes             | yes        |
//! | approved | no              | no              | no         |
//! | rejected | no              | yes             | no         |
//!
//! Each "no" is a [`EngineError::Conflict`], never a silent no-op.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod blob;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod query;
pub mod storage;
pub mod validate;

pub use blob::{content_hash, BlobStore, FsBlobStore, MemoryBlobStore};
pub use catalog::{CatalogService, NewUser, PlantInput, ShippingLineInput, UserUpdate};
pub use engine::{
    scope_to_caller, CustodyReport, EngineConfig, EvidenceUpload, InspectionEngine, NewInspection,
    PhotoCustody, DEFAULT_MAX_UPLOAD_BYTES,
};
pub use error::{BlobError, EngineError, EngineResult, StorageError, StorageResult};
pub use query::{
    InspectionFilter, Page, PageRequest, SortField, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use storage::{
    EventStorage, EvidenceStorage, Guarded, InMemoryStorage, InspectionStorage, PlantStorage,
    ShippingLineStorage, Storage, UserPatch, UserStorage,
};

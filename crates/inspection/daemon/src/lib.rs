//! Inspection daemon library
//!
//! This module provides the core components for the inspection daemon:
//! - REST API handlers and the caller extractor
//! - PostgreSQL storage backend
//! - In-app notifications fed by lifecycle events
//! - Server lifecycle management

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod api;
pub mod config;
pub mod error;
pub mod notifications;
pub mod server;
pub mod storage;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use notifications::NotificationCenter;
pub use server::Server;
pub use storage::{InMemoryStorage, PostgresStorage, Storage};

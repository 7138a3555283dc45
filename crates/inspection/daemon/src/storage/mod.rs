//! Storage backends for the daemon
//!
//! The in-memory store comes from the engine; PostgreSQL lives here.

mod postgres;

pub use inspection_engine::{InMemoryStorage, Storage};
pub use postgres::PostgresStorage;

//! REST API handlers

pub mod catalogs;
pub mod events;
pub mod evidence;
pub mod health;
pub mod inspections;
pub mod notifications;
pub mod reports;
pub mod users;

pub use catalogs::*;
pub use events::*;
pub use evidence::*;
pub use health::*;
pub use inspections::*;
pub use notifications::*;
pub use reports::*;
pub use users::*;

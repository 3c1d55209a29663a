//! API endpoint handlers.
//!
//! Handlers stay thin: they resolve the caller, open a connection and
//! delegate to the domain modules.

pub mod dashboard;
pub mod health;
pub mod parameters;
pub mod reports;
pub mod uploads;
pub mod users;

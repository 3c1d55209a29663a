//! HTTP API.
//!
//! Routes are nested under `/api/` and the protected ones run behind
//! a middleware stack: Rate Limit -> Auth -> Audit -> Handler.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer};
pub use types::ApiContext;

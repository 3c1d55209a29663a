//! API middleware stack.
//!
//! Execution order (outermost to innermost):
//! 1. Rate limiter, rejects early
//! 2. Auth validator, resolves the bearer token to a user
//! 3. Audit logger, runs after auth so it can name the user

pub mod audit;
pub mod auth;
pub mod rate;

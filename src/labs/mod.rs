//! Lab parameter reference data and the pure logic built on it.

pub mod normalize;
pub mod registry;
pub mod status;

pub use normalize::{normalize, normalize_with_default, ValidationError};
pub use status::classify;

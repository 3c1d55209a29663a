pub mod enums;
pub mod parameter;
pub mod report;
pub mod user;

pub use enums::*;
pub use parameter::*;
pub use report::*;
pub use user::*;

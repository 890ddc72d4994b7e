pub mod case;
pub mod enums;
pub mod filters;
pub mod user;

pub use case::*;
pub use enums::*;
pub use filters::*;
pub use user::*;

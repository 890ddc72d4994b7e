//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`, one sub-module per table.

mod case;
mod user;

pub use case::*;
pub use user::*;

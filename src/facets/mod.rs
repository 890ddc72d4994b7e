//! Faceted filtering over the case inbox.
//!
//! Given the case collection, the facet catalog and the current
//! `SelectionState`, `recompute` derives the filtered subset and, for each of
//! site / sector / doctor, the options to offer and their live counts:
//!
//! - the filtered subset applies every constraint conjunctively;
//! - an option's count applies every constraint *except* its own
//!   dimension's selection ("how many if I also picked this");
//! - picking sites narrows the sector and doctor options to that site;
//! - each picker's own search text narrows display only, never counts.

mod catalog;
mod dates;
mod engine;
mod selection;
mod types;

pub use catalog::*;
pub use dates::*;
pub use engine::*;
pub use selection::*;
pub use types::*;

// ── Tests ──────────────────────────────────────────────────────────────────

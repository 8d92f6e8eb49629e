//! CPU-side render sets.
//!
//! Responsibilities:
//! - own the flat arrays the GPU passes consume (`render` uploads them)
//! - resolve topology snapshots into renderable entries
//! - geometric hit-testing and per-entity visual state (hover/select/dim)
//!
//! Rendered colors are always recomputed from the canonical status color
//! plus the state flags; they are never mutated incrementally.

mod links;
mod nodes;

pub use links::{LinkSet, RenderLink};
pub use nodes::{NodeSet, RenderNode};

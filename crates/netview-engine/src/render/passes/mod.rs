//! Draw passes, one module per pass.
//!
//! Draw order is decided by the scene renderer: map background, link lines
//! + arrows, node circles (or icon sprites), labels, selection region. The
//! pick pass renders on demand into its own offscreen target.

pub mod icons;
pub mod labels;
pub mod links;
pub mod map;
pub mod nodes;
pub mod pick;
pub mod region;

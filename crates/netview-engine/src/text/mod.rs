//! Text subsystem: font ownership and measurement for the label pass.

mod font_system;

pub use font_system::{FontId, FontLoadError, FontSystem};

//! Coordinate and geometry types shared across the engine.
//!
//! Canonical spaces:
//! - World: the logical 2D plane topology positions live in (+X right, +Y down)
//! - Screen: canvas logical pixels, origin top-left
//! - Clip: GPU normalized device coordinates (-1..1, origin center, +Y up)
//!
//! The camera maps world directly to clip with a single [`Mat3`] affine;
//! screen-space passes convert logical pixels to NDC in shaders using a
//! viewport uniform.

mod mat3;
mod rect;
mod vec2;
mod viewport;

pub use mat3::Mat3;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;

//! Paint model shared between the scene and renderers.
//!
//! Scope is color representation only (linear premultiplied alpha);
//! geometry types remain in `coords`.

pub mod color;

pub use color::Color;

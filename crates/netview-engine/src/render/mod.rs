//! GPU rendering subsystem.
//!
//! Passes consume the CPU-side `scene` sets and issue GPU commands via
//! wgpu. Each pass is responsible for its own GPU resources (pipeline,
//! buffers, bindings); a pass whose resources are unavailable skips its
//! draw without affecting the others.
//!
//! Convention:
//! - topology geometry is in world units and converted to clip space in
//!   shaders through the camera uniform (one combined 3×3 affine)
//! - overlay passes (labels, selection region) are in logical pixels and
//!   convert to NDC through a viewport uniform

mod common;
mod ctx;
pub mod passes;
mod scene_renderer;

pub use ctx::{RenderCtx, RenderTarget};
pub use passes::icons::IconBitmap;
pub use passes::labels::Label;
pub use passes::map::MapImage;
pub use scene_renderer::SceneRenderer;

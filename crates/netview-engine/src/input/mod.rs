//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types; the
//! runtime translates window-system events into [`InputEvent`]s. Gesture
//! state machines (pan drag, rectangle select) live here too — they consume
//! screen coordinates only and leave camera conversions to the caller.

mod frame;
mod gesture;
mod state;
mod types;

pub use frame::InputFrame;
pub use gesture::{PanGesture, RectSelect};
pub use state::InputState;
pub use types::{
    InputEvent,
    Key,
    KeyState,
    Modifiers,
    MouseButton,
    MouseButtonState,
    MouseWheelDelta,
    PointerButtonEvent,
    PointerMoveEvent,
};

//! Time subsystem.
//!
//! Stable, testable frame timing without coupling to the runtime. Intended
//! usage: one `FrameClock` per window, `tick()` once per presented frame.
//! The clamped `dt` also drives camera animations.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};

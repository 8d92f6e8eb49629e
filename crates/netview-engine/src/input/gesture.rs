//! Drag gesture state machines: panning and rectangular selection.
//!
//! Both run over screen coordinates only (`idle → dragging → idle`); the
//! caller converts deltas/rects to world space through the camera. A
//! gesture interrupted by pointer-capture loss is ended with `cancel()`;
//! there is no timeout-based cancellation.

use crate::coords::{Rect, Vec2};

/// A rectangle drag shorter than this in either axis on release counts as
/// a click, not a selection.
const MIN_DRAG_PX: f32 = 10.0;

/// Pan drag tracker. Yields per-move screen deltas; the caller feeds them
/// to `Camera::pan`.
#[derive(Debug, Default)]
pub struct PanGesture {
    last: Option<Vec2>,
}

impl PanGesture {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_panning(&self) -> bool {
        self.last.is_some()
    }

    pub fn begin(&mut self, x: f32, y: f32) {
        self.last = Some(Vec2::new(x, y));
    }

    /// Advances the drag and returns the screen-space delta since the last
    /// call, or `None` when no pan is active.
    pub fn update(&mut self, x: f32, y: f32) -> Option<Vec2> {
        let last = self.last?;
        let now = Vec2::new(x, y);
        self.last = Some(now);
        Some(now - last)
    }

    pub fn end(&mut self) {
        self.last = None;
    }

    /// Alias for [`end`](Self::end); used on pointer-capture loss.
    pub fn cancel(&mut self) {
        self.last = None;
    }
}

/// Rectangular multi-select tracker over screen coordinates.
#[derive(Debug, Default)]
pub struct RectSelect {
    drag: Option<(Vec2, Vec2)>, // (start, current)
}

impl RectSelect {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    pub fn begin(&mut self, x: f32, y: f32) {
        let p = Vec2::new(x, y);
        self.drag = Some((p, p));
    }

    pub fn update(&mut self, x: f32, y: f32) {
        if let Some((_, current)) = &mut self.drag {
            *current = Vec2::new(x, y);
        }
    }

    /// Screen-space rectangle of the drag in progress, for overlay drawing.
    pub fn current_rect(&self) -> Option<Rect> {
        let (start, current) = self.drag?;
        Some(Rect::from_corners(start, current))
    }

    /// Ends the gesture. Returns the selected screen rectangle, or `None`
    /// when the drag stayed under the click threshold in either axis.
    pub fn finish(&mut self) -> Option<Rect> {
        let (start, current) = self.drag.take()?;
        if (current.x - start.x).abs() < MIN_DRAG_PX || (current.y - start.y).abs() < MIN_DRAG_PX {
            return None;
        }
        Some(Rect::from_corners(start, current))
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pan_yields_incremental_deltas() {
        let mut pan = PanGesture::new();
        assert!(pan.update(10.0, 10.0).is_none()); // idle

        pan.begin(100.0, 100.0);
        assert_eq!(pan.update(110.0, 95.0), Some(Vec2::new(10.0, -5.0)));
        assert_eq!(pan.update(110.0, 95.0), Some(Vec2::zero()));

        pan.end();
        assert!(pan.update(200.0, 200.0).is_none());
    }

    #[test]
    fn cancel_stops_a_pan_mid_drag() {
        let mut pan = PanGesture::new();
        pan.begin(0.0, 0.0);
        pan.cancel();
        assert!(!pan.is_panning());
    }

    #[test]
    fn short_drag_is_a_click_not_a_selection() {
        let mut sel = RectSelect::new();
        sel.begin(100.0, 100.0);
        sel.update(105.0, 180.0); // x axis under threshold
        assert!(sel.finish().is_none());

        sel.begin(100.0, 100.0);
        sel.update(180.0, 104.0); // y axis under threshold
        assert!(sel.finish().is_none());
    }

    #[test]
    fn real_drag_yields_a_normalized_rect() {
        let mut sel = RectSelect::new();
        sel.begin(200.0, 150.0);
        sel.update(120.0, 50.0); // dragged up-left
        let r = sel.finish().unwrap();
        assert_eq!(r, Rect::new(120.0, 50.0, 80.0, 100.0));
    }

    #[test]
    fn finish_consumes_the_gesture() {
        let mut sel = RectSelect::new();
        sel.begin(0.0, 0.0);
        sel.update(50.0, 50.0);
        assert!(sel.finish().is_some());
        assert!(sel.finish().is_none());
        assert!(!sel.is_active());
    }
}

//! 2D camera: zoom/pan state and the world↔screen↔clip mapping.
//!
//! The camera folds fit-to-canvas scaling, zoom, aspect correction, Y-flip
//! and pan into a single 3×3 affine (`world → clip`) plus its inverse.
//! Every mutating call recomputes both matrices, so callers can never
//! observe a transform that is stale with respect to zoom/pan/sizes.

use crate::coords::{Mat3, Rect, Vec2, Viewport};

/// Zoom clamp range.
#[derive(Debug, Copy, Clone)]
pub struct CameraLimits {
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self { min_zoom: 0.1, max_zoom: 40.0 }
    }
}

/// In-flight animation target. Both fields are always populated; a
/// zoom-only animation simply targets the current pan.
#[derive(Debug, Copy, Clone)]
struct CameraTarget {
    zoom: f32,
    pan: Vec2,
    /// Interpolation rate in 1/seconds (fraction of the remaining distance
    /// covered per second).
    rate: f32,
}

const ANIM_RATE: f32 = 8.0;
const ANIM_SNAP_ZOOM: f32 = 1e-3;
const ANIM_SNAP_PAN: f32 = 1e-2;

/// Camera over a world-space scene.
///
/// - `canvas`: drawable size in logical pixels
/// - `view`: world-space extent the scene occupies (used for the base
///   fit-to-canvas scale; pan/zoom move within and beyond it)
/// - `pan`: world-space offset of the view center
pub struct Camera {
    zoom: f32,
    pan: Vec2,
    canvas: Viewport,
    view: Viewport,
    limits: CameraLimits,

    matrix: Mat3,
    inverse: Mat3,

    anim: Option<CameraTarget>,
}

impl Camera {
    pub fn new(canvas: Viewport, view: Viewport) -> Self {
        let mut cam = Self {
            zoom: 1.0,
            pan: Vec2::zero(),
            canvas: sanitize(canvas),
            view: sanitize(view),
            limits: CameraLimits::default(),
            matrix: Mat3::IDENTITY,
            inverse: Mat3::IDENTITY,
            anim: None,
        };
        cam.update_matrices();
        cam
    }

    pub fn with_limits(mut self, limits: CameraLimits) -> Self {
        self.limits = limits;
        self.zoom = self.zoom.clamp(limits.min_zoom, limits.max_zoom);
        self.update_matrices();
        self
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[inline]
    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    #[inline]
    pub fn canvas_size(&self) -> Viewport {
        self.canvas
    }

    #[inline]
    pub fn view_size(&self) -> Viewport {
        self.view
    }

    /// The combined world→clip matrix.
    #[inline]
    pub fn matrix(&self) -> &Mat3 {
        &self.matrix
    }

    // ── input sizes ───────────────────────────────────────────────────────

    /// Updates the canvas size in logical pixels. Non-positive or non-finite
    /// extents are clamped to 1 to keep the matrix invertible.
    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.canvas = sanitize(Viewport::new(width, height));
        self.update_matrices();
    }

    /// Updates the world-space extent of the scene.
    pub fn set_view_size(&mut self, width: f32, height: f32) {
        self.view = sanitize(Viewport::new(width, height));
        self.update_matrices();
    }

    // ── zoom / pan ────────────────────────────────────────────────────────

    /// Sets the zoom, clamped to the configured limits. With `animate` the
    /// value becomes an interpolation target instead of taking effect
    /// immediately.
    pub fn set_zoom(&mut self, zoom: f32, animate: bool) {
        let zoom = zoom.clamp(self.limits.min_zoom, self.limits.max_zoom);
        if animate {
            let pan = self.anim.map_or(self.pan, |t| t.pan);
            self.anim = Some(CameraTarget { zoom, pan, rate: ANIM_RATE });
        } else {
            self.zoom = zoom;
            self.anim = None;
            self.update_matrices();
        }
    }

    /// Multiplies the zoom by `factor` while keeping the world point under
    /// the given screen position fixed. Exact: repeating the call at the
    /// same screen point never drifts.
    pub fn zoom_to_point(&mut self, screen_x: f32, screen_y: f32, factor: f32) {
        let before = self.screen_to_world(screen_x, screen_y);

        self.zoom = (self.zoom * factor).clamp(self.limits.min_zoom, self.limits.max_zoom);
        self.update_matrices();

        let after = self.screen_to_world(screen_x, screen_y);
        self.pan = self.pan + (before - after);
        self.anim = None;
        self.update_matrices();
    }

    /// Pans by a screen-space delta (drag: content follows the cursor).
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let delta = self.screen_to_world(dx, dy) - self.screen_to_world(0.0, 0.0);
        self.pan = self.pan - delta;
        self.anim = None;
        self.update_matrices();
    }

    /// Sets the absolute world-space pan offset.
    pub fn set_pan(&mut self, x: f32, y: f32, animate: bool) {
        if animate {
            let zoom = self.anim.map_or(self.zoom, |t| t.zoom);
            self.anim = Some(CameraTarget { zoom, pan: Vec2::new(x, y), rate: ANIM_RATE });
        } else {
            self.pan = Vec2::new(x, y);
            self.anim = None;
            self.update_matrices();
        }
    }

    /// Fits a world-space rectangle (plus padding on every side) into the
    /// canvas and centers on it. The resulting zoom is clamped to limits.
    pub fn zoom_to_bounds(&mut self, bounds: Rect, padding: f32) {
        let r = bounds.normalized();
        let target_w = r.size.x + padding * 2.0;
        let target_h = r.size.y + padding * 2.0;

        if target_w > 0.0 && target_h > 0.0 {
            let (vis_w, vis_h) = self.visible_extent_at_unit_zoom();
            let zoom = (vis_w / target_w).min(vis_h / target_h);
            self.zoom = zoom.clamp(self.limits.min_zoom, self.limits.max_zoom);
        }

        let center = r.center();
        self.pan = Vec2::new(
            center.x - self.view.width * 0.5,
            center.y - self.view.height * 0.5,
        );
        self.anim = None;
        self.update_matrices();
    }

    // ── animation ─────────────────────────────────────────────────────────

    /// Advances any in-flight zoom/pan animation by `dt` seconds of linear
    /// interpolation toward the target. Returns whether an animation is
    /// still in progress (i.e. the caller should keep requesting frames).
    pub fn update(&mut self, dt: f32) -> bool {
        let Some(target) = self.anim else {
            return false;
        };

        let t = (target.rate * dt.max(0.0)).clamp(0.0, 1.0);
        self.zoom += (target.zoom - self.zoom) * t;
        self.pan = self.pan + (target.pan - self.pan) * t;

        let done = (target.zoom - self.zoom).abs() < ANIM_SNAP_ZOOM
            && self.pan.distance(target.pan) < ANIM_SNAP_PAN;
        if done {
            self.zoom = target.zoom;
            self.pan = target.pan;
            self.anim = None;
        }

        self.update_matrices();
        self.anim.is_some()
    }

    // ── conversions ───────────────────────────────────────────────────────

    /// Screen (logical px, top-left origin) → world.
    pub fn screen_to_world(&self, x: f32, y: f32) -> Vec2 {
        let clip = Vec2::new(
            2.0 * x / self.canvas.width - 1.0,
            1.0 - 2.0 * y / self.canvas.height,
        );
        self.inverse.transform_point(clip)
    }

    /// World → screen (logical px, top-left origin).
    pub fn world_to_screen(&self, x: f32, y: f32) -> Vec2 {
        let clip = self.matrix.transform_point(Vec2::new(x, y));
        Vec2::new(
            (clip.x + 1.0) * 0.5 * self.canvas.width,
            (1.0 - clip.y) * 0.5 * self.canvas.height,
        )
    }

    /// World-space rectangle currently visible, derived from the four
    /// canvas corners.
    pub fn visible_bounds(&self) -> Rect {
        let c = [
            self.screen_to_world(0.0, 0.0),
            self.screen_to_world(self.canvas.width, 0.0),
            self.screen_to_world(0.0, self.canvas.height),
            self.screen_to_world(self.canvas.width, self.canvas.height),
        ];

        let mut min = c[0];
        let mut max = c[0];
        for p in &c[1..] {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        Rect::from_corners(min, max)
    }

    // ── matrix construction ───────────────────────────────────────────────

    /// Rebuilds the combined matrix and its inverse from the current zoom,
    /// pan, canvas size and view size.
    ///
    /// The transform is built directly as one affine: a base scale fitting
    /// the view into the canvas (preserving aspect), times zoom, with the X
    /// scale corrected by the canvas aspect, the Y axis flipped (world is
    /// Y-down, clip is Y-up), and a translation placing the panned view
    /// center at clip origin.
    fn update_matrices(&mut self) {
        let canvas_aspect = self.canvas.aspect();
        let view_aspect = self.view.aspect();

        let (sx, sy) = if canvas_aspect > view_aspect {
            // Canvas relatively wider than the scene: fit to height.
            let sy = 2.0 / self.view.height * self.zoom;
            (sy / canvas_aspect, sy)
        } else {
            // Fit to width.
            let sx = 2.0 / self.view.width * self.zoom;
            (sx, sx * canvas_aspect)
        };
        let sy = -sy;

        let center = Vec2::new(
            self.view.width * 0.5 + self.pan.x,
            self.view.height * 0.5 + self.pan.y,
        );

        self.matrix = Mat3::from_scale_translation(sx, sy, -sx * center.x, -sy * center.y);
        self.inverse = self.matrix.inverse_or_identity();
    }

    /// World extent visible at zoom = 1 under the current fit rule.
    fn visible_extent_at_unit_zoom(&self) -> (f32, f32) {
        let canvas_aspect = self.canvas.aspect();
        if canvas_aspect > self.view.aspect() {
            (self.view.height * canvas_aspect, self.view.height)
        } else {
            (self.view.width, self.view.width / canvas_aspect)
        }
    }
}

fn sanitize(v: Viewport) -> Viewport {
    if v.is_valid() {
        v
    } else {
        log::warn!("invalid viewport {}x{}, clamping", v.width, v.height);
        Viewport::new(v.width.max(1.0), v.height.max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn cam() -> Camera {
        Camera::new(Viewport::new(1000.0, 800.0), Viewport::new(2000.0, 1600.0))
    }

    fn assert_close(a: Vec2, b: Vec2, eps: f32) {
        assert!(
            (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn screen_center_maps_to_view_center() {
        let c = cam();
        assert_close(c.screen_to_world(500.0, 400.0), Vec2::new(1000.0, 800.0), EPS);
    }

    #[test]
    fn world_screen_round_trip() {
        let mut c = cam();
        c.set_zoom(3.7, false);
        c.set_pan(123.0, -456.0, false);

        for (sx, sy) in [(0.0, 0.0), (500.0, 400.0), (999.0, 1.0), (250.5, 777.25)] {
            let w = c.screen_to_world(sx, sy);
            let s = c.world_to_screen(w.x, w.y);
            assert_close(s, Vec2::new(sx, sy), EPS);
        }
    }

    #[test]
    fn screen_world_round_trip() {
        let mut c = cam();
        c.set_canvas_size(1280.0, 720.0);
        c.set_zoom(0.4, false);

        for (wx, wy) in [(0.0, 0.0), (1000.0, 800.0), (-350.0, 2200.0)] {
            let s = c.world_to_screen(wx, wy);
            let w = c.screen_to_world(s.x, s.y);
            assert_close(w, Vec2::new(wx, wy), EPS);
        }
    }

    #[test]
    fn zoom_is_clamped_to_limits() {
        let mut c = cam().with_limits(CameraLimits { min_zoom: 0.5, max_zoom: 4.0 });
        c.set_zoom(100.0, false);
        assert_eq!(c.zoom(), 4.0);
        c.set_zoom(0.0001, false);
        assert_eq!(c.zoom(), 0.5);
    }

    #[test]
    fn zoom_to_point_keeps_cursor_world_position() {
        let mut c = cam();
        let (sx, sy) = (730.0, 120.0);
        let anchor = c.screen_to_world(sx, sy);

        for _ in 0..8 {
            c.zoom_to_point(sx, sy, 1.25);
            assert_close(c.screen_to_world(sx, sy), anchor, EPS);
        }
        for _ in 0..8 {
            c.zoom_to_point(sx, sy, 0.8);
            assert_close(c.screen_to_world(sx, sy), anchor, EPS);
        }
    }

    #[test]
    fn plain_zoom_contracts_distances_toward_center() {
        let mut c = cam();
        let center = Vec2::new(1000.0, 800.0);
        let before = c.screen_to_world(700.0, 500.0);

        c.set_zoom(2.0, false);
        let after = c.screen_to_world(700.0, 500.0);

        let ratio = after.distance(center) / before.distance(center);
        assert!((ratio - 0.5).abs() < 1e-3, "ratio = {ratio}");
    }

    #[test]
    fn visible_bounds_covers_view_at_unit_zoom() {
        let c = cam();
        // Canvas and view share the same aspect, so the whole view is visible.
        let b = c.visible_bounds();
        assert_close(b.min(), Vec2::zero(), EPS);
        assert_close(b.max(), Vec2::new(2000.0, 1600.0), EPS);
    }

    #[test]
    fn pan_moves_content_with_the_cursor() {
        let mut c = cam();
        let grabbed = c.screen_to_world(300.0, 300.0);
        c.pan(50.0, -20.0);
        // The world point previously under (300, 300) is now under (350, 280).
        assert_close(c.screen_to_world(350.0, 280.0), grabbed, EPS);
    }

    #[test]
    fn zoom_to_bounds_centers_and_fits() {
        let mut c = cam();
        let target = Rect::new(400.0, 300.0, 200.0, 100.0);
        c.zoom_to_bounds(target, 10.0);

        let center = c.screen_to_world(500.0, 400.0);
        assert_close(center, Vec2::new(500.0, 350.0), EPS);

        let b = c.visible_bounds();
        assert!(b.size.x + EPS >= 220.0 && b.size.y + EPS >= 120.0);
    }

    #[test]
    fn degenerate_canvas_is_clamped() {
        let mut c = cam();
        c.set_canvas_size(0.0, -5.0);
        let w = c.screen_to_world(0.5, 0.5);
        assert!(w.is_finite());
    }

    #[test]
    fn animated_zoom_converges_and_reports_completion() {
        let mut c = cam();
        c.set_zoom(4.0, true);
        assert_eq!(c.zoom(), 1.0); // not applied yet

        let mut running = true;
        for _ in 0..600 {
            running = c.update(1.0 / 60.0);
            if !running {
                break;
            }
        }
        assert!(!running);
        assert!((c.zoom() - 4.0).abs() < 1e-3);
    }
}

//! View transform between screen pixels and fractal space.
//!
//! Screen space: physical pixels, origin top-left, +Y down.
//! Fractal space: `world = screen / scale + offset`, per axis.
//!
//! The fragment stage applies the same mapping to `@builtin(position)`, so
//! whatever this module computes is exactly what ends up on screen.

use crate::vec2::Vec2;

/// Canonical framing of the whole Mandelbrot set, used by "reset view".
pub const HOME_REGION: (Vec2, Vec2) = (Vec2::new(-2.5, -1.25), Vec2::new(1.0, 1.25));

/// Bounds on each `scale` component (pixels per fractal unit).
///
/// Both ends stay well inside `f32` range, so the values uploaded to the
/// shader are always finite.
pub const MIN_SCALE: f64 = 1e-30;
pub const MAX_SCALE: f64 = 1e30;

fn scale_in_range(scale: Vec2) -> bool {
    (MIN_SCALE..=MAX_SCALE).contains(&scale.x) && (MIN_SCALE..=MAX_SCALE).contains(&scale.y)
}

/// Zoom direction for one discrete zoom step.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Everything the fragment stage needs to know about the current view.
///
/// Invariant: both components of `scale` lie in `[MIN_SCALE, MAX_SCALE]`
/// and `offset` is finite. Every mutator below preserves it as long as its
/// inputs are finite and zoom factors are positive.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportState {
    /// Fractal-space point mapped to screen position `(0, 0)`.
    pub offset: Vec2,

    /// Pixels per fractal unit, per axis. Anisotropic on purpose.
    pub scale: Vec2,

    /// Viewport dimensions in physical pixels.
    pub screen_size: (u32, u32),

    /// Escape-iteration cap. Fixed for a session.
    pub iteration_limit: u32,
}

impl ViewportState {
    /// Startup view: offset at the origin and one fractal unit spanning the
    /// initial screen on each axis (`scale = screen_size`).
    ///
    /// A zero dimension is treated as one pixel so scale stays positive.
    pub fn new(screen_size: (u32, u32), iteration_limit: u32) -> Self {
        Self {
            offset: Vec2::zero(),
            scale: Vec2::from((screen_size.0.max(1), screen_size.1.max(1))),
            screen_size,
            iteration_limit,
        }
    }

    pub fn screen_to_world(&self, screen_pos: Vec2) -> Vec2 {
        screen_pos / self.scale + self.offset
    }

    pub fn world_to_screen(&self, world_pos: Vec2) -> Vec2 {
        (world_pos - self.offset) * self.scale
    }

    /// Applies one zoom step, keeping the fractal point under
    /// `anchor_screen_pos` fixed on screen.
    ///
    /// `after` must be computed with the new scale but the old offset; the
    /// offset correction is the only thing that moves the view.
    ///
    /// Returns `false` and leaves the state untouched when the step would
    /// push `scale` outside `[MIN_SCALE, MAX_SCALE]` or make `offset`
    /// non-finite.
    pub fn zoom(&mut self, direction: ZoomDirection, anchor_screen_pos: Vec2, factor: f64) -> bool {
        debug_assert!(factor > 0.0 && factor.is_finite(), "zoom factor must be positive");

        let scale = match direction {
            ZoomDirection::In => self.scale * factor,
            ZoomDirection::Out => self.scale / factor,
        };
        if !scale_in_range(scale) {
            return false;
        }

        let before = self.screen_to_world(anchor_screen_pos);
        let after = anchor_screen_pos / scale + self.offset;
        let offset = self.offset - (after - before);
        if !offset.is_finite() {
            return false;
        }

        self.scale = scale;
        self.offset = offset;
        true
    }

    /// Moves the view by a screen-space delta (the content follows the cursor).
    pub fn pan(&mut self, delta_screen_pos: Vec2) {
        self.offset -= delta_screen_pos / self.scale;
    }

    /// Changes the screen size only. The view is not re-anchored: a larger
    /// window shows more of the plane at the same scale.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        self.screen_size = new_size;
    }

    /// Visible fractal rectangle as `(min, max)` corners.
    pub fn visible_region(&self) -> (Vec2, Vec2) {
        let min = self.offset;
        let max = self.offset + Vec2::from(self.screen_size) / self.scale;
        (min, max)
    }

    /// Sets offset and scale so that `[min, max]` exactly fills the screen.
    ///
    /// Returns `false` and leaves the state untouched when the rectangle or
    /// the screen has no positive extent on some axis, or when the resulting
    /// scale falls outside `[MIN_SCALE, MAX_SCALE]`.
    pub fn frame_region(&mut self, min: Vec2, max: Vec2) -> bool {
        let extent = max - min;
        let screen = Vec2::from(self.screen_size);

        let valid = extent.is_finite()
            && min.is_finite()
            && extent.x > 0.0
            && extent.y > 0.0
            && screen.x > 0.0
            && screen.y > 0.0;
        if !valid {
            return false;
        }

        let scale = screen / extent;
        if !scale_in_range(scale) {
            return false;
        }

        self.offset = min;
        self.scale = scale;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    fn state(offset: Vec2, scale: Vec2, screen: (u32, u32)) -> ViewportState {
        ViewportState {
            offset,
            scale,
            screen_size: screen,
            iteration_limit: 256,
        }
    }

    fn assert_close(a: Vec2, b: Vec2) {
        let tol = |x: f64, y: f64| 1e-9 * x.abs().max(y.abs()).max(1.0);
        assert!(
            (a.x - b.x).abs() <= tol(a.x, b.x) && (a.y - b.y).abs() <= tol(a.y, b.y),
            "{a:?} != {b:?}"
        );
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn new_uses_screen_size_as_scale() {
        let s = ViewportState::new((640, 480), 100);
        assert_eq!(s.offset, Vec2::zero());
        assert_eq!(s.scale, v(640.0, 480.0));
        assert_eq!(s.screen_size, (640, 480));
        assert_eq!(s.iteration_limit, 100);
    }

    #[test]
    fn new_with_zero_dimension_keeps_scale_positive() {
        let s = ViewportState::new((0, 0), 1);
        assert!(s.scale.x > 0.0 && s.scale.y > 0.0);
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn screen_to_world_divides_then_offsets() {
        let s = state(v(-2.0, 1.0), v(100.0, 50.0), (800, 600));
        assert_eq!(s.screen_to_world(v(200.0, 100.0)), v(0.0, 3.0));
    }

    #[test]
    fn world_to_screen_inverts_screen_to_world() {
        let s = state(v(-0.7436, 0.1318), v(3.0e5, 2.2e5), (1920, 1080));
        let p = v(812.25, 333.5);
        assert_close(s.world_to_screen(s.screen_to_world(p)), p);
    }

    #[test]
    fn visible_region_spans_screen_over_scale() {
        let s = state(v(1.0, 2.0), v(10.0, 20.0), (100, 200));
        assert_eq!(s.visible_region(), (v(1.0, 2.0), v(11.0, 12.0)));
    }

    // ── zoom ──────────────────────────────────────────────────────────────

    #[test]
    fn zoom_in_keeps_anchor_fixed() {
        let mut s = state(v(-2.3, -1.1), v(310.0, 275.0), (1024, 768));
        for anchor in [v(0.0, 0.0), v(512.0, 384.0), v(1023.0, 5.5), v(-40.0, 900.0)] {
            let before = s.screen_to_world(anchor);
            s.zoom(ZoomDirection::In, anchor, 1.5);
            assert_close(s.screen_to_world(anchor), before);
        }
    }

    #[test]
    fn zoom_out_keeps_anchor_fixed() {
        let mut s = state(v(0.25, -0.5), v(4000.0, 3500.0), (800, 600));
        let anchor = v(123.0, 456.0);
        let before = s.screen_to_world(anchor);
        s.zoom(ZoomDirection::Out, anchor, 2.0);
        assert_close(s.screen_to_world(anchor), before);
    }

    #[test]
    fn zoom_in_then_out_restores_view() {
        let original = state(v(-0.75, 0.1), v(640.0, 480.0), (1280, 720));
        let mut s = original;
        let anchor = v(300.0, 200.0);

        s.zoom(ZoomDirection::In, anchor, 1.5);
        s.zoom(ZoomDirection::Out, anchor, 1.5);

        assert_close(s.scale, original.scale);
        assert_close(s.offset, original.offset);
    }

    #[test]
    fn zoom_sequence_keeps_scale_positive() {
        let mut s = ViewportState::new((640, 480), 64);
        let anchors = [v(10.0, 10.0), v(600.0, 20.0), v(320.0, 240.0)];
        for i in 0..300 {
            let dir = if i % 3 == 2 { ZoomDirection::Out } else { ZoomDirection::In };
            s.zoom(dir, anchors[i % anchors.len()], 1.5);
            assert!(s.scale.x > 0.0 && s.scale.y > 0.0, "step {i}: {:?}", s.scale);
        }
        for _ in 0..300 {
            s.zoom(ZoomDirection::Out, v(0.0, 0.0), 1.5);
            assert!(s.scale.x > 0.0 && s.scale.y > 0.0);
        }
    }

    #[test]
    fn long_zoom_runs_stay_finite_and_anchored() {
        let mut s = ViewportState::new((640, 480), 256);
        let anchor = v(320.0, 240.0);

        for direction in [ZoomDirection::Out, ZoomDirection::In] {
            for step in 0..4000 {
                let prev = s;
                let before = s.screen_to_world(anchor);
                let applied = s.zoom(direction, anchor, 1.5);

                assert!(s.offset.is_finite(), "{direction:?} step {step}: {s:?}");
                assert!(scale_in_range(s.scale), "{direction:?} step {step}: {s:?}");
                assert!(s.screen_to_world(anchor).is_finite());
                if applied {
                    // Error scales with the terms summed, not with the result.
                    let terms = [prev.offset, anchor / prev.scale, s.offset, anchor / s.scale];
                    let magnitude = terms
                        .iter()
                        .fold(1.0_f64, |m, t| m.max(t.x.abs()).max(t.y.abs()));
                    let after = s.screen_to_world(anchor);
                    assert!(
                        (after.x - before.x).abs() <= 1e-12 * magnitude
                            && (after.y - before.y).abs() <= 1e-12 * magnitude,
                        "{direction:?} step {step}: {before:?} moved to {after:?}"
                    );
                } else {
                    assert_eq!(s, prev, "refused step must not move the view");
                }
            }
        }

        // Both limits are reached well within 4000 steps of 1.5x.
        assert!(!s.zoom(ZoomDirection::In, anchor, 1.5));
        assert!(s.scale.x * 1.5 > MAX_SCALE || s.scale.y * 1.5 > MAX_SCALE);

        let [sx, sy] = s.scale.to_f32();
        let [ox, oy] = s.offset.to_f32();
        assert!(sx.is_finite() && sy.is_finite() && ox.is_finite() && oy.is_finite());
    }

    #[test]
    fn zoom_out_stops_at_min_scale() {
        let mut s = state(Vec2::zero(), v(MIN_SCALE * 1.2, 1.0), (640, 480));
        let before = s;

        assert!(!s.zoom(ZoomDirection::Out, v(10.0, 10.0), 1.5));
        assert_eq!(s, before);
    }

    #[test]
    fn zoom_at_screen_center_matches_reference_scenario() {
        let mut s = state(Vec2::zero(), v(640.0, 480.0), (1280, 720));
        let center = v(640.0, 360.0);
        assert_eq!(s.screen_to_world(center), v(1.0, 0.75));

        s.zoom(ZoomDirection::In, center, 1.5);

        assert_eq!(s.scale, v(960.0, 720.0));
        assert_close(s.screen_to_world(center), v(1.0, 0.75));
    }

    // ── pan ───────────────────────────────────────────────────────────────

    #[test]
    fn pan_moves_offset_against_drag() {
        let mut s = state(Vec2::zero(), v(100.0, 200.0), (800, 600));
        s.pan(v(50.0, -40.0));
        assert_eq!(s.offset, v(-0.5, 0.2));
    }

    #[test]
    fn pan_is_linear() {
        let base = state(v(-1.0, 0.5), v(333.0, 271.0), (800, 600));
        let (d1, d2) = (v(12.0, -7.5), v(-3.25, 40.0));

        let mut stepwise = base;
        stepwise.pan(d1);
        stepwise.pan(d2);

        let mut once = base;
        once.pan(d1 + d2);

        assert_close(stepwise.offset, once.offset);
        assert_eq!(stepwise.scale, base.scale);
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_changes_only_screen_size() {
        let before = state(v(-0.123, 0.456), v(789.0, 654.0), (640, 480));
        let mut s = before;
        s.resize((1920, 1080));

        assert_eq!(s.screen_size, (1920, 1080));
        assert_eq!(s.offset.x.to_bits(), before.offset.x.to_bits());
        assert_eq!(s.offset.y.to_bits(), before.offset.y.to_bits());
        assert_eq!(s.scale.x.to_bits(), before.scale.x.to_bits());
        assert_eq!(s.scale.y.to_bits(), before.scale.y.to_bits());
    }

    // ── frame_region ──────────────────────────────────────────────────────

    #[test]
    fn frame_region_fills_screen() {
        let mut s = ViewportState::new((700, 500), 256);
        let (min, max) = HOME_REGION;
        assert!(s.frame_region(min, max));

        let (vmin, vmax) = s.visible_region();
        assert_close(vmin, min);
        assert_close(vmax, max);
        assert_eq!(s.scale, v(200.0, 200.0));
    }

    #[test]
    fn frame_region_rejects_out_of_range_scale() {
        let original = ViewportState::new((640, 480), 256);
        let mut s = original;

        assert!(!s.frame_region(v(0.0, 0.0), v(1e-40, 1e-40)));
        assert_eq!(s, original);
    }

    #[test]
    fn frame_region_rejects_degenerate_rectangles() {
        let original = ViewportState::new((640, 480), 256);
        let mut s = original;

        assert!(!s.frame_region(v(1.0, 0.0), v(1.0, 2.0)));
        assert!(!s.frame_region(v(0.0, 2.0), v(1.0, 1.0)));
        assert!(!s.frame_region(v(0.0, 0.0), v(f64::INFINITY, 1.0)));
        assert_eq!(s, original);

        s.resize((0, 480));
        assert!(!s.frame_region(v(0.0, 0.0), v(1.0, 1.0)));
        assert_eq!(s.scale, original.scale);
    }
}

use super::{ImageSize, Vec2};

/// Mapping between pixel space and sketch space for one render target.
///
/// Sketch space is centered on the target, +Y up, and its shorter axis spans
/// `[-1, +1]`. The longer axis spans `[-aspect, +aspect]` for wide targets and
/// `[-1/aspect, +1/aspect]` for tall ones.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SketchSpace {
    size: ImageSize,
}

impl SketchSpace {
    #[inline]
    pub fn new(size: ImageSize) -> Self {
        Self { size }
    }

    #[inline]
    pub fn size(self) -> ImageSize {
        self.size
    }

    #[inline]
    pub fn aspect_ratio(self) -> f32 {
        self.size.aspect_ratio()
    }

    /// Half extents of the visible region, in sketch units.
    ///
    /// One component is always exactly `1.0`.
    #[inline]
    pub fn extent(self) -> Vec2 {
        let aspect = self.aspect_ratio();
        if aspect >= 1.0 {
            Vec2::new(aspect, 1.0)
        } else {
            Vec2::new(1.0, 1.0 / aspect)
        }
    }

    /// Converts a pixel position (origin top-left, +Y down) to sketch space.
    pub fn window_to_relative_coords(self, pixel: Vec2) -> Vec2 {
        let w = self.size.width() as f32;
        let h = self.size.height() as f32;

        let normalized = Vec2::new(pixel.x / w, 1.0 - pixel.y / h);
        let centered = normalized * 2.0 - Vec2::splat(1.0);
        let extent = self.extent();
        Vec2::new(centered.x * extent.x, centered.y * extent.y)
    }

    /// Inverse of [`window_to_relative_coords`](Self::window_to_relative_coords).
    pub fn relative_to_window_coords(self, point: Vec2) -> Vec2 {
        let clip = self.relative_to_clip(point);
        let w = self.size.width() as f32;
        let h = self.size.height() as f32;
        Vec2::new((clip.x + 1.0) * 0.5 * w, (1.0 - (clip.y + 1.0) * 0.5) * h)
    }

    /// Projects a sketch-space point into clip space (`[-1, 1]²`, +Y up).
    ///
    /// The rectangle vertex shader performs the same division by `extent`.
    #[inline]
    pub fn relative_to_clip(self, point: Vec2) -> Vec2 {
        let extent = self.extent();
        Vec2::new(point.x / extent.x, point.y / extent.y)
    }

    /// Whether a sketch-space point lies inside the visible region.
    pub fn contains(self, point: Vec2) -> bool {
        let extent = self.extent();
        point.x.abs() <= extent.x && point.y.abs() <= extent.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(w: u32, h: u32) -> SketchSpace {
        SketchSpace::new(ImageSize::new(w, h).unwrap())
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5
    }

    // ── extent ────────────────────────────────────────────────────────────

    #[test]
    fn wide_target_stretches_x() {
        assert_eq!(space(400, 200).extent(), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn tall_target_stretches_y() {
        assert_eq!(space(200, 400).extent(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn square_target_is_unit() {
        assert_eq!(space(300, 300).extent(), Vec2::new(1.0, 1.0));
    }

    // ── window_to_relative_coords ─────────────────────────────────────────

    #[test]
    fn window_center_is_origin() {
        let s = space(800, 600);
        assert!(approx(s.window_to_relative_coords(Vec2::new(400.0, 300.0)), Vec2::zero()));
    }

    #[test]
    fn top_left_pixel_maps_to_top_left_corner() {
        let s = space(400, 200);
        assert!(approx(s.window_to_relative_coords(Vec2::zero()), Vec2::new(-2.0, 1.0)));
    }

    #[test]
    fn bottom_right_pixel_maps_to_bottom_right_corner() {
        let s = space(200, 400);
        let p = s.window_to_relative_coords(Vec2::new(200.0, 400.0));
        assert!(approx(p, Vec2::new(1.0, -2.0)));
    }

    #[test]
    fn y_axis_is_flipped() {
        let s = space(100, 100);
        let upper = s.window_to_relative_coords(Vec2::new(50.0, 10.0));
        let lower = s.window_to_relative_coords(Vec2::new(50.0, 90.0));
        assert!(upper.y > lower.y);
    }

    #[test]
    fn one_sketch_unit_is_half_the_shorter_side() {
        // 400x200: one unit along either axis covers 100 pixels.
        let s = space(400, 200);
        let a = s.window_to_relative_coords(Vec2::new(200.0, 100.0));
        let b = s.window_to_relative_coords(Vec2::new(300.0, 0.0));
        assert!(approx(b - a, Vec2::new(1.0, 1.0)));
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn inverse_transform_recovers_pixels() {
        let s = space(640, 480);
        for px in [Vec2::new(0.0, 0.0), Vec2::new(13.0, 470.0), Vec2::new(640.0, 1.0)] {
            let back = s.relative_to_window_coords(s.window_to_relative_coords(px));
            assert!((back.x - px.x).abs() < 1e-3 && (back.y - px.y).abs() < 1e-3);
        }
    }

    #[test]
    fn clip_space_corners() {
        let s = space(400, 200);
        assert!(approx(s.relative_to_clip(Vec2::new(2.0, 1.0)), Vec2::new(1.0, 1.0)));
        assert!(approx(s.relative_to_clip(Vec2::new(-2.0, -1.0)), Vec2::new(-1.0, -1.0)));
    }

    #[test]
    fn contains_respects_extent() {
        let s = space(400, 200);
        assert!(s.contains(Vec2::new(1.9, 0.9)));
        assert!(!s.contains(Vec2::new(0.0, 1.1)));
    }
}

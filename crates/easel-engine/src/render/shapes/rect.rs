use crate::coords::{SketchSpace, Vec2};
use crate::device::GpuDevice;
use crate::error::{SketchError, SketchResult};
use crate::paint::Color;

use super::common::{ShapeProgram, ShapeUniform};

/// Point of a rectangle that [`RectangleParams::position`] refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Anchor {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    /// Offset from the anchor to the center, in units of the half size,
    /// before rotation.
    fn to_center(self) -> Vec2 {
        match self {
            Anchor::Center => Vec2::zero(),
            Anchor::TopLeft => Vec2::new(1.0, -1.0),
            Anchor::TopRight => Vec2::new(-1.0, -1.0),
            Anchor::BottomLeft => Vec2::new(1.0, 1.0),
            Anchor::BottomRight => Vec2::new(-1.0, 1.0),
        }
    }
}

/// Placement of a rectangle (or of the box of an ellipse or image) in sketch space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RectangleParams {
    pub anchor: Anchor,
    /// Position of the anchor point.
    pub position: Vec2,
    /// Full width and height, in sketch units.
    pub size: Vec2,
    /// Counter-clockwise rotation about the center, in radians.
    pub rotation: f32,
}

impl RectangleParams {
    pub fn centered(center: impl Into<Vec2>, size: impl Into<Vec2>) -> Self {
        Self {
            anchor: Anchor::Center,
            position: center.into(),
            size: size.into(),
            rotation: 0.0,
        }
    }

    pub fn square(center: impl Into<Vec2>, side: f32) -> Self {
        Self::centered(center, Vec2::splat(side))
    }

    pub fn from_corner(anchor: Anchor, corner: impl Into<Vec2>, size: impl Into<Vec2>) -> Self {
        Self {
            anchor,
            position: corner.into(),
            size: size.into(),
            rotation: 0.0,
        }
    }

    /// Covers the whole visible region of `space`.
    pub fn full_screen(space: SketchSpace) -> Self {
        Self::centered(Vec2::zero(), space.extent() * 2.0)
    }

    pub fn rotated(mut self, angle: f32) -> Self {
        self.rotation = angle;
        self
    }

    /// Center of the rectangle after applying the anchor and rotation.
    pub fn center(&self) -> Vec2 {
        let half = self.half_extents();
        let offset = self.anchor.to_center();
        let local = Vec2::new(offset.x * half.x, offset.y * half.y);
        self.position + local.rotated(self.rotation)
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size.abs() * 0.5
    }

    pub(crate) fn validate(&self) -> SketchResult<()> {
        if !self.position.is_finite() || !self.size.is_finite() || !self.rotation.is_finite() {
            return Err(SketchError::invalid(format!(
                "non-finite rectangle geometry: {self:?}"
            )));
        }
        Ok(())
    }

    /// Builds the per-draw uniform for these params in `space`.
    pub(crate) fn to_uniform(
        &self,
        space: SketchSpace,
        fill: Color,
        stroke: Color,
        stroke_weight: f32,
    ) -> ShapeUniform {
        ShapeUniform {
            fill_color: fill.to_array(),
            stroke_color: stroke.to_array(),
            center: self.center().to_array(),
            rect_size: self.half_extents().to_array(),
            axis_extent: space.extent().to_array(),
            rotation: self.rotation,
            stroke_weight: stroke_weight.max(0.0),
        }
    }
}

impl Default for RectangleParams {
    fn default() -> Self {
        Self::square(Vec2::zero(), 1.0)
    }
}

pub(crate) fn rect_program(device: &GpuDevice) -> SketchResult<ShapeProgram> {
    ShapeProgram::new(device, "rect", include_str!("../shaders/rect.wgsl"), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ImageSize;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5
    }

    // ── anchors ───────────────────────────────────────────────────────────

    #[test]
    fn centered_center_is_position() {
        let p = RectangleParams::centered((0.3, -0.2), (1.0, 2.0));
        assert!(approx(p.center(), Vec2::new(0.3, -0.2)));
    }

    #[test]
    fn top_left_corner_anchor() {
        let p = RectangleParams::from_corner(Anchor::TopLeft, (-1.0, 1.0), (0.5, 0.4));
        assert!(approx(p.center(), Vec2::new(-0.75, 0.8)));
    }

    #[test]
    fn bottom_right_corner_anchor() {
        let p = RectangleParams::from_corner(Anchor::BottomRight, (1.0, -1.0), (2.0, 2.0));
        assert!(approx(p.center(), Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn rotation_pivots_around_the_anchor() {
        let p = RectangleParams::from_corner(Anchor::BottomLeft, (0.0, 0.0), (2.0, 2.0))
            .rotated(std::f32::consts::FRAC_PI_2);
        // (1, 1) rotated a quarter turn.
        assert!(approx(p.center(), Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn negative_size_is_treated_as_its_magnitude() {
        let p = RectangleParams::centered((0.0, 0.0), (-2.0, 1.0));
        assert!(approx(p.half_extents(), Vec2::new(1.0, 0.5)));
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    #[test]
    fn full_screen_covers_extent() {
        let space = SketchSpace::new(ImageSize::new(400, 200).unwrap());
        let u = RectangleParams::full_screen(space).to_uniform(space, Color::WHITE, Color::BLACK, 0.0);
        assert_eq!(u.rect_size, u.axis_extent);
        assert_eq!(u.axis_extent, [2.0, 1.0]);
    }

    #[test]
    fn uniform_carries_half_extents_and_colors() {
        let space = SketchSpace::new(ImageSize::new(100, 100).unwrap());
        let fill = Color::rgba(1.0, 0.0, 0.0, 1.0);
        let u = RectangleParams::square((0.0, 0.0), 1.0).to_uniform(space, fill, Color::BLACK, -1.0);
        assert_eq!(u.rect_size, [0.5, 0.5]);
        assert_eq!(u.fill_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(u.stroke_weight, 0.0);
    }

    #[test]
    fn nan_geometry_is_rejected() {
        let p = RectangleParams::centered((f32::NAN, 0.0), (1.0, 1.0));
        assert!(matches!(p.validate(), Err(SketchError::InvalidArgument(_))));
        assert!(RectangleParams::default().validate().is_ok());
    }
}

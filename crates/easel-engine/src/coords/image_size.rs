use crate::error::{SketchError, SketchResult};

/// Size of an image in pixels. Both dimensions are at least 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    /// Returns `InvalidArgument` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> SketchResult<Self> {
        if width == 0 || height == 0 {
            return Err(SketchError::invalid(format!(
                "image size must be at least 1x1, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Like [`new`](Self::new), but zero dimensions are raised to 1.
    #[inline]
    pub fn clamped(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    #[inline]
    pub fn width(self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(self) -> u32 {
        self.height
    }

    /// `width / height`.
    #[inline]
    pub fn aspect_ratio(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    #[inline]
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Component-wise minimum: the overlap of two sizes anchored at the same origin.
    #[inline]
    pub fn intersection(self, other: ImageSize) -> ImageSize {
        ImageSize {
            width: self.width.min(other.width),
            height: self.height.min(other.height),
        }
    }

    pub(crate) fn extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(ImageSize::new(0, 10), Err(SketchError::InvalidArgument(_))));
        assert!(matches!(ImageSize::new(10, 0), Err(SketchError::InvalidArgument(_))));
    }

    #[test]
    fn aspect_ratio_is_width_over_height() {
        for (w, h) in [(1, 1), (800, 600), (400, 200), (3, 7), (1920, 1080)] {
            let size = ImageSize::new(w, h).unwrap();
            assert_eq!(size.aspect_ratio(), w as f32 / h as f32);
        }
    }

    #[test]
    fn clamped_raises_zero_to_one() {
        let size = ImageSize::clamped(0, 5);
        assert_eq!((size.width(), size.height()), (1, 5));
    }

    #[test]
    fn intersection_is_componentwise_min() {
        let a = ImageSize::new(10, 30).unwrap();
        let b = ImageSize::new(20, 20).unwrap();
        assert_eq!(a.intersection(b), ImageSize::new(10, 20).unwrap());
    }
}

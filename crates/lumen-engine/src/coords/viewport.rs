use super::Vec2;

/// Primary surface size in physical pixels.
///
/// The compositor sets this as the GPU viewport for every item draw, and
/// render targets are sized from it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Maps an NDC point to pixel coordinates (top-left origin, +Y down).
    #[inline]
    pub fn ndc_to_pixel(self, p: Vec2) -> Vec2 {
        Vec2::new(
            (p.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - p.y) * 0.5 * self.height as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_corners_map_to_surface_corners() {
        let vp = Viewport::new(600, 400);
        assert_eq!(vp.ndc_to_pixel(Vec2::new(-1.0, 1.0)), Vec2::new(0.0, 0.0));
        assert_eq!(vp.ndc_to_pixel(Vec2::new(1.0, -1.0)), Vec2::new(600.0, 400.0));
        assert_eq!(vp.ndc_to_pixel(Vec2::new(0.0, 0.0)), Vec2::new(300.0, 200.0));
    }

    #[test]
    fn zero_sized_viewport_is_invalid() {
        assert!(!Viewport::new(0, 10).is_valid());
        assert!(Viewport::new(1, 1).is_valid());
    }
}

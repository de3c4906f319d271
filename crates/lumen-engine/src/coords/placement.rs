use super::Vec2;

/// Screen placement of a quad, given by two opposite corners in NDC.
///
/// `start` receives texture coordinate `(0, 0)` (the first row of the image)
/// and `end` receives `(1, 1)`. Corners may be given in any order; swapping
/// them mirrors the image instead of being rejected.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Placement {
    pub start: Vec2,
    pub end: Vec2,
}

impl Placement {
    /// The whole surface, upright: image row 0 at the top edge.
    pub const FULL_SCREEN: Placement = Placement::new(Vec2::new(-1.0, 1.0), Vec2::new(1.0, -1.0));

    /// Texture-space unit rectangle, used as the texcoord stream for every quad.
    pub const UNIT: Placement = Placement::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));

    #[inline]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn from_corners(start_x: f32, start_y: f32, end_x: f32, end_y: f32) -> Self {
        Self::new(Vec2::new(start_x, start_y), Vec2::new(end_x, end_y))
    }

    /// Two triangles (6 vertices) covering the rectangle.
    ///
    /// Vertex order: `s, (e.x, s.y), (s.x, e.y), (s.x, e.y), (e.x, s.y), e`.
    /// `UNIT.vertices()` yields matching texture coordinates for any placement.
    pub fn vertices(self) -> [[f32; 2]; 6] {
        let (s, e) = (self.start, self.end);
        [
            [s.x, s.y],
            [e.x, s.y],
            [s.x, e.y],
            [s.x, e.y],
            [e.x, s.y],
            [e.x, e.y],
        ]
    }

    /// Returns true if the rectangle has no area.
    #[inline]
    pub fn is_degenerate(self) -> bool {
        self.start.x == self.end.x || self.start.y == self.end.y
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    /// Half-open containment test in NDC, independent of corner order.
    pub fn contains(self, p: Vec2) -> bool {
        let (x0, x1) = min_max(self.start.x, self.end.x);
        let (y0, y1) = min_max(self.start.y, self.end.y);
        p.x >= x0 && p.x < x1 && p.y >= y0 && p.y < y1
    }
}

#[inline]
fn min_max(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_cover_two_triangles() {
        let p = Placement::from_corners(-1.0, 1.0, 0.0, 0.0);
        assert_eq!(
            p.vertices(),
            [
                [-1.0, 1.0],
                [0.0, 1.0],
                [-1.0, 0.0],
                [-1.0, 0.0],
                [0.0, 1.0],
                [0.0, 0.0],
            ]
        );
    }

    #[test]
    fn unit_texcoords_pair_start_with_origin() {
        let uv = Placement::UNIT.vertices();
        let pos = Placement::FULL_SCREEN.vertices();
        // Top-left of the screen samples the first texel row.
        assert_eq!(pos[0], [-1.0, 1.0]);
        assert_eq!(uv[0], [0.0, 0.0]);
        assert_eq!(pos[5], [1.0, -1.0]);
        assert_eq!(uv[5], [1.0, 1.0]);
    }

    #[test]
    fn contains_ignores_corner_order() {
        let a = Placement::from_corners(1.0, 0.0, 0.0, 1.0);
        assert!(a.contains(Vec2::new(0.5, 0.5)));
        assert!(!a.contains(Vec2::new(-0.5, 0.5)));
    }

    #[test]
    fn degenerate_when_an_axis_collapses() {
        assert!(Placement::from_corners(0.0, 0.0, 0.0, 1.0).is_degenerate());
        assert!(!Placement::FULL_SCREEN.is_degenerate());
    }
}

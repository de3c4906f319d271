/// Straight-alpha RGBA color with `f32` channels in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Opaque cyan, the surface clear color of the demo scene.
    pub const CYAN: Color = Color::new(0.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from 8-bit channels.
    #[inline]
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        Self::new(
            rgba[0] as f32 / 255.0,
            rgba[1] as f32 / 255.0,
            rgba[2] as f32 / 255.0,
            rgba[3] as f32 / 255.0,
        )
    }

    /// Quantizes to 8-bit channels, clamping out-of-range values.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl From<[f32; 4]> for Color {
    #[inline]
    fn from(c: [f32; 4]) -> Self {
        Color::new(c[0], c[1], c[2], c[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_round_trip_is_exact() {
        let px = [0, 128, 255, 77];
        assert_eq!(Color::from_rgba8(px).to_rgba8(), px);
    }

    #[test]
    fn to_rgba8_clamps() {
        assert_eq!(Color::new(-1.0, 2.0, 0.5, 1.0).to_rgba8(), [0, 255, 128, 255]);
    }
}

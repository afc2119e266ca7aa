use serde::{Deserialize, Serialize};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Opaque color from unit-range channels, rounding `v * 255`.
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        Self::opaque(unit_to_byte(r), unit_to_byte(g), unit_to_byte(b))
    }

    /// Channels as unit-range floats (alpha dropped).
    pub fn to_unit(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `RRGGBB` into an opaque color.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::opaque(r, g, b))
    }
}

#[inline]
fn unit_to_byte(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Linear blend of two colors, rounding each channel.
pub(crate) fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| ((a as f64 * t_inv) + (b as f64 * t)).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unit_rounds_and_clamps() {
        assert_eq!(Color::from_unit(1.0, 0.5, -1.0), Color::opaque(255, 128, 0));
        assert_eq!(Color::from_unit(f64::NAN, 2.0, 0.0), Color::opaque(0, 255, 0));
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = Color::opaque(0, 100, 200);
        let b = Color::new(255, 0, 100, 0);
        assert_eq!(interpolate_color(a, b, 0.0), a);
        assert_eq!(interpolate_color(a, b, 1.0), b);
        assert_eq!(interpolate_color(a, b, 0.5), Color::new(128, 50, 150, 128));
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#FF8000"), Some(Color::opaque(255, 128, 0)));
        assert_eq!(Color::from_hex("zz0000"), None);
        assert_eq!(Color::from_hex("#FFF"), None);
    }
}

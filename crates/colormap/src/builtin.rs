//! Built-in palettes.
//!
//! Each palette is a generator evaluated at the requested LUT length, so a
//! built-in map never loses resolution when the LUT size changes.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::colormap::Colormap;

const VIRIDIS: [[f64; 3]; 6] = [
    [0.267004, 0.004874, 0.329415],
    [0.253935, 0.265254, 0.529983],
    [0.163625, 0.471133, 0.558148],
    [0.134692, 0.658636, 0.517649],
    [0.477504, 0.821444, 0.318195],
    [0.993248, 0.906157, 0.143936],
];

const PLASMA: [[f64; 3]; 6] = [
    [0.050383, 0.029803, 0.527975],
    [0.417642, 0.000564, 0.658390],
    [0.692840, 0.165141, 0.564522],
    [0.881443, 0.392529, 0.383229],
    [0.988260, 0.652325, 0.211364],
    [0.940015, 0.975158, 0.131326],
];

const INFERNO: [[f64; 3]; 7] = [
    [0.001462, 0.000466, 0.013866],
    [0.141935, 0.040119, 0.324538],
    [0.364543, 0.071579, 0.431994],
    [0.609330, 0.178249, 0.450586],
    [0.851384, 0.346636, 0.280346],
    [0.987622, 0.645320, 0.039886],
    [0.988362, 0.998364, 0.644924],
];

const MAGMA: [[f64; 3]; 7] = [
    [0.001462, 0.000466, 0.013866],
    [0.171713, 0.067305, 0.370771],
    [0.445163, 0.122724, 0.506901],
    [0.716387, 0.214982, 0.475290],
    [0.944006, 0.377643, 0.365136],
    [0.997351, 0.676795, 0.429406],
    [0.987053, 0.991438, 0.749504],
];

/// The built-in palette set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinColormap {
    #[serde(alias = "gray")]
    Grey,
    Heat,
    Cool,
    Rainbow,
    Bb,
    He,
    Aips0,
    Staircase,
    Color,
    A,
    B,
    Sls,
    Hsv,
    Standard,
    Red,
    Green,
    Blue,
    I8,
    Viridis,
    Plasma,
    Inferno,
    Magma,
}

impl BuiltinColormap {
    pub const ALL: [BuiltinColormap; 22] = [
        Self::Grey,
        Self::Heat,
        Self::Cool,
        Self::Rainbow,
        Self::Bb,
        Self::He,
        Self::Aips0,
        Self::Staircase,
        Self::Color,
        Self::A,
        Self::B,
        Self::Sls,
        Self::Hsv,
        Self::Standard,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::I8,
        Self::Viridis,
        Self::Plasma,
        Self::Inferno,
        Self::Magma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Grey => "grey",
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Rainbow => "rainbow",
            Self::Bb => "bb",
            Self::He => "he",
            Self::Aips0 => "aips0",
            Self::Staircase => "staircase",
            Self::Color => "color",
            Self::A => "a",
            Self::B => "b",
            Self::Sls => "sls",
            Self::Hsv => "hsv",
            Self::Standard => "standard",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::I8 => "i8",
            Self::Viridis => "viridis",
            Self::Plasma => "plasma",
            Self::Inferno => "inferno",
            Self::Magma => "magma",
        }
    }

    /// Case-insensitive lookup; `gray` is accepted for `grey`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        if lower == "gray" {
            return Some(Self::Grey);
        }
        Self::ALL.into_iter().find(|map| map.name() == lower)
    }

    /// Evaluate the palette at `n` evenly spaced positions (`n` is raised to 2).
    pub fn generate(&self, n: usize) -> Vec<Color> {
        let n = n.max(2);
        (0..n)
            .map(|i| {
                let [r, g, b] = self.sample(i, n);
                Color::from_unit(r, g, b)
            })
            .collect()
    }

    pub fn colormap(&self, n: usize) -> Colormap {
        Colormap::from_validated(self.name(), self.generate(n))
    }

    fn sample(&self, i: usize, n: usize) -> [f64; 3] {
        let t = i as f64 / (n - 1) as f64;
        match self {
            Self::Grey | Self::Standard => [t, t, t],
            Self::Heat => {
                if t < 0.33 {
                    [t * 3.0, 0.0, 0.0]
                } else if t < 0.67 {
                    [1.0, (t - 0.33) * 3.0, 0.0]
                } else {
                    [1.0, 1.0, (t - 0.67) * 3.0]
                }
            }
            Self::Cool => [t, 1.0 - t, 1.0],
            Self::Rainbow => {
                if t < 0.2 {
                    [1.0, t * 5.0, 0.0]
                } else if t < 0.4 {
                    [1.0 - (t - 0.2) * 5.0, 1.0, 0.0]
                } else if t < 0.6 {
                    [0.0, 1.0, (t - 0.4) * 5.0]
                } else if t < 0.8 {
                    [0.0, 1.0 - (t - 0.6) * 5.0, 1.0]
                } else {
                    [(t - 0.8) * 5.0, 0.0, 1.0]
                }
            }
            Self::Bb => {
                if t < 0.25 {
                    [t * 4.0, 0.0, 0.0]
                } else if t < 0.5 {
                    [1.0, (t - 0.25) * 4.0, 0.0]
                } else if t < 0.75 {
                    [1.0, 1.0, (t - 0.5) * 4.0]
                } else {
                    [1.0, 1.0, 1.0]
                }
            }
            Self::He => {
                let phase = 2.0 * PI * t;
                [
                    0.5 * (1.0 + phase.sin()),
                    0.5 * (1.0 + (phase + 2.0 * PI / 3.0).sin()),
                    0.5 * (1.0 + (phase + 4.0 * PI / 3.0).sin()),
                ]
            }
            Self::Aips0 => aips0(t),
            Self::Staircase => {
                let step = ((i as f64 / n as f64) * 16.0) as usize;
                [
                    (step % 4) as f64 / 3.0,
                    ((step / 4) % 4) as f64 / 3.0,
                    (step / 8) as f64 / 2.0,
                ]
            }
            Self::Color => [
                (t * PI).sin().abs(),
                (t * PI + PI / 3.0).sin().abs(),
                (t * PI + 2.0 * PI / 3.0).sin().abs(),
            ],
            Self::A => [t, t, 1.0],
            Self::B => [1.0, t, t],
            Self::Sls => {
                if t < 0.25 {
                    [0.0, t * 4.0, 1.0]
                } else if t < 0.5 {
                    [0.0, 1.0, 1.0 - (t - 0.25) * 4.0]
                } else if t < 0.75 {
                    [(t - 0.5) * 4.0, 1.0, 0.0]
                } else {
                    [1.0, 1.0 - (t - 0.75) * 4.0, 0.0]
                }
            }
            Self::Hsv => hue_to_rgb(i as f64 / n as f64),
            Self::Red => [t, 0.0, 0.0],
            Self::Green => [0.0, t, 0.0],
            Self::Blue => [0.0, 0.0, t],
            Self::I8 => {
                let segment = (t * 8.0) as u32;
                let bit = |shift: u32| ((segment >> shift) & 1) as f64 * 0.5 + t * 0.5;
                [bit(0), bit(1), bit(2)]
            }
            Self::Viridis => from_stops(&VIRIDIS, t),
            Self::Plasma => from_stops(&PLASMA, t),
            Self::Inferno => from_stops(&INFERNO, t),
            Self::Magma => from_stops(&MAGMA, t),
        }
    }
}

fn aips0(t: f64) -> [f64; 3] {
    let s = |start: f64| (t - start) * 8.0;
    if t < 0.125 {
        [0.0, 0.0, t * 8.0]
    } else if t < 0.25 {
        [0.0, s(0.125), 1.0]
    } else if t < 0.375 {
        [0.0, 1.0, 1.0 - s(0.25)]
    } else if t < 0.5 {
        [s(0.375), 1.0, 0.0]
    } else if t < 0.625 {
        [1.0, 1.0 - s(0.5), 0.0]
    } else if t < 0.75 {
        [1.0, 0.0, s(0.625)]
    } else if t < 0.875 {
        [1.0, s(0.75), 1.0]
    } else {
        [1.0, 1.0, 1.0]
    }
}

/// Fully saturated hue wheel, `h` in `[0, 1)`.
fn hue_to_rgb(h: f64) -> [f64; 3] {
    let x = 1.0 - ((h * 6.0) % 2.0 - 1.0).abs();
    match (h * 6.0) as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

/// Piecewise-linear interpolation through evenly spaced stops.
fn from_stops(stops: &[[f64; 3]], t: f64) -> [f64; 3] {
    let last = stops.len() - 1;
    let pos = t.clamp(0.0, 1.0) * last as f64;
    let lo = (pos.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = pos - lo as f64;
    let mut out = [0.0; 3];
    for (c, value) in out.iter_mut().enumerate() {
        *value = stops[lo][c] + (stops[hi][c] - stops[lo][c]) * frac;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for map in BuiltinColormap::ALL {
            assert_eq!(BuiltinColormap::from_name(map.name()), Some(map));
        }
        assert_eq!(BuiltinColormap::from_name("GRAY"), Some(BuiltinColormap::Grey));
        assert_eq!(BuiltinColormap::from_name("cubehelix"), None);
    }

    #[test]
    fn test_grey_endpoints() {
        let lut = BuiltinColormap::Grey.generate(256);
        assert_eq!(lut.len(), 256);
        assert_eq!(lut[0], Color::BLACK);
        assert_eq!(lut[255], Color::WHITE);
        assert!(lut.windows(2).all(|w| w[0].r <= w[1].r && w[0].r == w[0].g));
    }

    #[test]
    fn test_every_builtin_is_opaque() {
        for map in BuiltinColormap::ALL {
            let lut = map.generate(64);
            assert_eq!(lut.len(), 64, "{}", map.name());
            assert!(lut.iter().all(|c| c.a == 255), "{}", map.name());
        }
    }

    #[test]
    fn test_viridis_hits_stop_endpoints() {
        let lut = BuiltinColormap::Viridis.generate(256);
        assert_eq!(lut[0], Color::from_unit(0.267004, 0.004874, 0.329415));
        assert_eq!(lut[255], Color::from_unit(0.993248, 0.906157, 0.143936));
    }

    #[test]
    fn test_tiny_lut_is_raised_to_two() {
        assert_eq!(BuiltinColormap::Heat.generate(0).len(), 2);
    }

    #[test]
    fn test_hsv_starts_red() {
        let lut = BuiltinColormap::Hsv.generate(360);
        assert_eq!(lut[0], Color::opaque(255, 0, 0));
        assert_eq!(lut[120], Color::opaque(0, 255, 0));
    }
}

use serde::{Deserialize, Serialize};

use crate::color::{interpolate_color, Color};
use crate::error::{ColormapError, Result};

/// A named, ordered sequence of color stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredColormap")]
pub struct Colormap {
    name: String,
    stops: Vec<Color>,
}

/// Unchecked serialized form; deserializing goes through [`Colormap::from_stops`].
#[derive(Deserialize)]
struct StoredColormap {
    name: String,
    stops: Vec<Color>,
}

impl TryFrom<StoredColormap> for Colormap {
    type Error = ColormapError;

    fn try_from(stored: StoredColormap) -> Result<Self> {
        Self::from_stops(stored.name, stored.stops)
    }
}

impl Colormap {
    /// Build a colormap from at least one stop.
    pub fn from_stops(name: impl Into<String>, stops: Vec<Color>) -> Result<Self> {
        if stops.is_empty() {
            return Err(ColormapError::InvalidColors(
                "a colormap needs at least one color".to_string(),
            ));
        }
        Ok(Self::from_validated(name, stops))
    }

    /// Build from unit-range RGB triples (the `.lut` representation).
    pub fn from_unit_rgb(name: impl Into<String>, rgb: &[[f64; 3]]) -> Result<Self> {
        let stops = rgb
            .iter()
            .map(|&[r, g, b]| Color::from_unit(r, g, b))
            .collect();
        Self::from_stops(name, stops)
    }

    pub(crate) fn from_validated(name: impl Into<String>, stops: Vec<Color>) -> Self {
        Self {
            name: name.into(),
            stops,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[Color] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// The same stops in reverse order, named `<name>_r`.
    pub fn reversed(&self) -> Self {
        let mut stops = self.stops.clone();
        stops.reverse();
        Self::from_validated(format!("{}_r", self.name), stops)
    }

    /// Resample to `n` entries by per-channel linear interpolation across stop index.
    ///
    /// Output entry `i` sits at stop position `i * (len - 1) / (n - 1)`. When `n`
    /// equals the stop count the stops are returned unchanged.
    pub fn resample(&self, n: usize) -> Vec<Color> {
        let len = self.stops.len();
        if n == len {
            return self.stops.clone();
        }
        if n == 0 {
            return Vec::new();
        }
        if n == 1 || len == 1 {
            return vec![self.stops[0]; n];
        }

        let scale = (len - 1) as f64 / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let pos = i as f64 * scale;
                let lo = (pos.floor() as usize).min(len - 1);
                let hi = (lo + 1).min(len - 1);
                interpolate_color(self.stops[lo], self.stops[hi], pos - lo as f64)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop() -> Colormap {
        Colormap::from_stops("bw", vec![Color::BLACK, Color::WHITE]).unwrap()
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            Colormap::from_stops("none", vec![]),
            Err(ColormapError::InvalidColors(_))
        ));
    }

    #[test]
    fn test_resample_interpolates() {
        let lut = two_stop().resample(3);
        assert_eq!(lut[0], Color::BLACK);
        assert_eq!(lut[1], Color::opaque(128, 128, 128));
        assert_eq!(lut[2], Color::WHITE);
    }

    #[test]
    fn test_resample_same_length_is_identity() {
        let stops: Vec<Color> = (0..7).map(|i| Color::new(i * 30, 7, 200 - i, i)).collect();
        let map = Colormap::from_stops("odd", stops.clone()).unwrap();
        assert_eq!(map.resample(7), stops);
    }

    #[test]
    fn test_resample_single_stop() {
        let map = Colormap::from_stops("one", vec![Color::opaque(1, 2, 3)]).unwrap();
        assert_eq!(map.resample(4), vec![Color::opaque(1, 2, 3); 4]);
    }

    #[test]
    fn test_reversed() {
        let rev = two_stop().reversed();
        assert_eq!(rev.name(), "bw_r");
        assert_eq!(rev.stops(), &[Color::WHITE, Color::BLACK]);
    }
}

//! The active lookup table.
//!
//! [`ColormapEngine`] owns the registry and rebuilds its [`Lut`] whenever the
//! colormap name, the inversion flag or the LUT length changes. The LUT itself is
//! an immutable, cheaply cloned snapshot that worker threads can use while the
//! engine moves on.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::builtin::BuiltinColormap;
use crate::color::Color;
use crate::colormap::Colormap;
use crate::error::{ColormapError, Result};
use crate::registry::ColormapRegistry;

/// Default LUT length.
pub const DEFAULT_LUT_SIZE: usize = 256;

/// Buffers at least this long are colorized in parallel.
const PARALLEL_THRESHOLD: usize = 64 * 1024;
const PARALLEL_CHUNK: usize = 16 * 1024;

/// A materialized RGBA lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut {
    entries: Arc<[Color]>,
}

impl Lut {
    fn new(entries: Vec<Color>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    /// LUT index for a normalized value: `clip(t * (L - 1))`, truncated.
    /// NaN maps to index 0.
    #[inline]
    pub fn index_for(&self, t: f32) -> usize {
        let max = (self.entries.len() - 1) as f32;
        if t.is_nan() {
            return 0;
        }
        (t * max).clamp(0.0, max) as usize
    }

    #[inline]
    pub fn color_for(&self, t: f32) -> Color {
        self.entries[self.index_for(t)]
    }

    /// Colorize normalized values into a new RGBA8 buffer.
    pub fn apply(&self, normalized: &[f32]) -> Vec<u8> {
        let mut out = vec![0u8; normalized.len() * 4];
        self.apply_into(normalized, &mut out);
        out
    }

    /// Colorize into `out`, which holds four bytes per input value.
    ///
    /// Only `min(normalized.len(), out.len() / 4)` pixels are written.
    pub fn apply_into(&self, normalized: &[f32], out: &mut [u8]) {
        let pixels = normalized.len().min(out.len() / 4);
        let normalized = &normalized[..pixels];
        let out = &mut out[..pixels * 4];

        let colorize = |values: &[f32], rgba: &mut [u8]| {
            for (t, px) in values.iter().zip(rgba.chunks_exact_mut(4)) {
                px.copy_from_slice(&self.color_for(*t).to_array());
            }
        };

        if pixels >= PARALLEL_THRESHOLD {
            normalized
                .par_chunks(PARALLEL_CHUNK)
                .zip(out.par_chunks_mut(PARALLEL_CHUNK * 4))
                .for_each(|(values, rgba)| colorize(values, rgba));
        } else {
            colorize(normalized, out);
        }
    }
}

/// Maps normalized values to RGBA through the active colormap.
#[derive(Debug, Clone)]
pub struct ColormapEngine {
    registry: ColormapRegistry,
    lut_size: usize,
    current: String,
    inverted: bool,
    lut: Lut,
}

impl Default for ColormapEngine {
    fn default() -> Self {
        let lut = Lut::new(BuiltinColormap::Grey.generate(DEFAULT_LUT_SIZE));
        Self {
            registry: ColormapRegistry::new(),
            lut_size: DEFAULT_LUT_SIZE,
            current: BuiltinColormap::Grey.name().to_string(),
            inverted: false,
            lut,
        }
    }
}

impl ColormapEngine {
    /// Engine showing `colormap` with a LUT of `lut_size` entries.
    pub fn new(colormap: &str, lut_size: usize) -> Result<Self> {
        check_lut_size(lut_size)?;
        let mut engine = Self {
            lut_size,
            current: colormap.to_string(),
            ..Self::default()
        };
        engine.rebuild();
        Ok(engine)
    }

    /// Name of the requested colormap (even if it fell back to grey).
    pub fn current_colormap(&self) -> &str {
        &self.current
    }

    /// Select a colormap. Unknown names render as grey; returns whether the
    /// name resolved.
    pub fn set_colormap(&mut self, name: &str) -> bool {
        self.current = name.to_string();
        self.rebuild()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        if self.inverted != inverted {
            self.inverted = inverted;
            self.lut = reversed(&self.lut);
        }
    }

    pub fn lut_size(&self) -> usize {
        self.lut_size
    }

    /// Change the LUT length and rebuild. Custom maps are resampled from their
    /// original stops.
    pub fn set_lut_size(&mut self, lut_size: usize) -> Result<()> {
        check_lut_size(lut_size)?;
        if lut_size != self.lut_size {
            self.lut_size = lut_size;
            self.rebuild();
        }
        Ok(())
    }

    /// Register a custom colormap from an arbitrary-length RGBA array.
    pub fn register_colormap(&mut self, name: &str, colors: Vec<Color>) -> Result<()> {
        self.register(Colormap::from_stops(name, colors)?);
        Ok(())
    }

    /// Register a prepared colormap (for example one parsed from a `.lut` file).
    pub fn register(&mut self, colormap: Colormap) {
        let name = colormap.name().to_string();
        debug!(colormap = %name, stops = colormap.len(), "Registered colormap");
        self.registry.register(colormap);
        if name == self.current {
            self.rebuild();
        }
    }

    pub fn registry(&self) -> &ColormapRegistry {
        &self.registry
    }

    pub fn available_colormaps(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Snapshot of the active LUT; cheap to clone and `Send + Sync`.
    pub fn lut(&self) -> &Lut {
        &self.lut
    }

    pub fn apply(&self, normalized: &[f32]) -> Vec<u8> {
        self.lut.apply(normalized)
    }

    pub fn apply_into(&self, normalized: &[f32], out: &mut [u8]) {
        self.lut.apply_into(normalized, out)
    }

    /// Color of a single normalized value, e.g. for a colorbar.
    pub fn color_for(&self, t: f32) -> Color {
        self.lut.color_for(t)
    }

    fn rebuild(&mut self) -> bool {
        let (entries, resolved) = match self.registry.resolve(&self.current, self.lut_size) {
            Some(entries) => (entries, true),
            None => {
                warn!(colormap = %self.current, "Unknown colormap, falling back to grey");
                (BuiltinColormap::Grey.generate(self.lut_size), false)
            }
        };
        let lut = Lut::new(entries);
        self.lut = if self.inverted { reversed(&lut) } else { lut };
        resolved
    }
}

fn reversed(lut: &Lut) -> Lut {
    let mut entries = lut.entries().to_vec();
    entries.reverse();
    Lut::new(entries)
}

fn check_lut_size(lut_size: usize) -> Result<()> {
    if lut_size < 2 {
        return Err(ColormapError::InvalidLutSize(lut_size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_grey() {
        let engine = ColormapEngine::default();
        assert_eq!(engine.current_colormap(), "grey");
        assert_eq!(engine.lut().len(), DEFAULT_LUT_SIZE);
        assert_eq!(engine.color_for(0.0), Color::BLACK);
        assert_eq!(engine.color_for(1.0), Color::WHITE);
    }

    #[test]
    fn test_unknown_falls_back_to_grey() {
        let mut engine = ColormapEngine::default();
        assert!(!engine.set_colormap("does-not-exist"));
        assert_eq!(engine.current_colormap(), "does-not-exist");
        assert_eq!(engine.lut().entries(), BuiltinColormap::Grey.generate(256).as_slice());
    }

    #[test]
    fn test_inversion_reverses_without_regenerating() {
        let mut engine = ColormapEngine::new("heat", 64).unwrap();
        let forward = engine.lut().entries().to_vec();
        engine.set_inverted(true);
        let mut expected = forward.clone();
        expected.reverse();
        assert_eq!(engine.lut().entries(), expected.as_slice());
        engine.set_inverted(false);
        assert_eq!(engine.lut().entries(), forward.as_slice());
    }

    #[test]
    fn test_inversion_survives_colormap_change() {
        let mut engine = ColormapEngine::default();
        engine.set_inverted(true);
        engine.set_colormap("red");
        assert_eq!(engine.color_for(0.0), Color::opaque(255, 0, 0));
    }

    #[test]
    fn test_index_truncates_and_clamps() {
        let engine = ColormapEngine::new("grey", 4).unwrap();
        let lut = engine.lut();
        assert_eq!(lut.index_for(-1.0), 0);
        assert_eq!(lut.index_for(0.5), 1);
        assert_eq!(lut.index_for(0.99), 2);
        assert_eq!(lut.index_for(1.0), 3);
        assert_eq!(lut.index_for(7.0), 3);
        assert_eq!(lut.index_for(f32::NAN), 0);
    }

    #[test]
    fn test_apply_writes_rgba() {
        let engine = ColormapEngine::default();
        let out = engine.apply(&[0.0, 1.0]);
        assert_eq!(out, vec![0, 0, 0, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn test_lut_size_validation() {
        assert!(matches!(
            ColormapEngine::new("grey", 1),
            Err(ColormapError::InvalidLutSize(1))
        ));
        let mut engine = ColormapEngine::default();
        assert!(engine.set_lut_size(0).is_err());
        engine.set_lut_size(16).unwrap();
        assert_eq!(engine.lut().len(), 16);
    }

    #[test]
    fn test_registering_current_name_rebuilds() {
        let mut engine = ColormapEngine::new("mine", 4).unwrap();
        engine
            .register_colormap("mine", vec![Color::opaque(10, 20, 30); 2])
            .unwrap();
        assert_eq!(engine.color_for(0.5), Color::opaque(10, 20, 30));
    }
}

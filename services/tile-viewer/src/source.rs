//! Pixel sources for the viewer: a procedural star field and raw `f32` files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tile_common::{FetchError, InMemorySource, PixelBuffer, PixelRegion, PixelSource};

/// Side of the buckets stars are indexed by.
const CELL: u32 = 64;

#[derive(Debug, Clone, Copy)]
struct Star {
    x: f32,
    y: f32,
    amplitude: f32,
    sigma: f32,
}

/// A deterministic synthetic sky computed on demand, so arbitrarily large
/// images cost nothing until a region is fetched.
pub struct SyntheticSky {
    width: u32,
    height: u32,
    background: f32,
    noise: f32,
    seed: u64,
    cells: HashMap<(u32, u32), Vec<Star>>,
}

impl SyntheticSky {
    pub fn new(width: u32, height: u32, num_stars: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut cells: HashMap<(u32, u32), Vec<Star>> = HashMap::new();
        let num_stars = if width == 0 || height == 0 { 0 } else { num_stars };
        for _ in 0..num_stars {
            let star = Star {
                x: rng.gen_range(0.0..width as f32),
                y: rng.gen_range(0.0..height as f32),
                // Few bright stars, many faint ones.
                amplitude: 20.0 + 50_000.0 * rng.gen::<f32>().powi(4),
                sigma: rng.gen_range(0.8..3.0),
            };
            let key = (star.x as u32 / CELL, star.y as u32 / CELL);
            cells.entry(key).or_default().push(star);
        }
        Self {
            width,
            height,
            background: 100.0,
            noise: 5.0,
            seed,
            cells,
        }
    }

    pub fn star_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    fn value_at(&self, x: u32, y: u32) -> f32 {
        let (cx, cy) = (x / CELL, y / CELL);
        let mut value = self.background + self.noise * self.hash_noise(x, y);
        for ny in cy.saturating_sub(1)..=cy + 1 {
            for nx in cx.saturating_sub(1)..=cx + 1 {
                let Some(stars) = self.cells.get(&(nx, ny)) else {
                    continue;
                };
                for star in stars {
                    let dx = x as f32 + 0.5 - star.x;
                    let dy = y as f32 + 0.5 - star.y;
                    let r2 = dx * dx + dy * dy;
                    let s2 = star.sigma * star.sigma;
                    if r2 < 25.0 * s2 {
                        value += star.amplitude * (-r2 / (2.0 * s2)).exp();
                    }
                }
            }
        }
        value
    }

    /// Stateless noise in [-1, 1) from the pixel position.
    fn hash_noise(&self, x: u32, y: u32) -> f32 {
        let mut h = self.seed ^ (((x as u64) << 32) | y as u64);
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        (h >> 40) as f32 / (1u64 << 23) as f32 - 1.0
    }
}

impl PixelSource for SyntheticSky {
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError> {
        if !region.fits_within(self.width, self.height) {
            return Err(FetchError::new(
                region,
                format!("outside {}x{} image", self.width, self.height),
            ));
        }
        let mut data = Vec::with_capacity(region.len());
        for y in region.y..region.bottom() {
            for x in region.x..region.right() {
                data.push(self.value_at(x, y));
            }
        }
        Ok(data)
    }
}

/// Load a headerless little-endian `f32` image of `width` x `height` pixels.
pub fn load_raw_f32(path: &Path, width: u32, height: u32) -> Result<InMemorySource> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let expected = width as usize * height as usize * 4;
    if bytes.len() != expected {
        bail!(
            "{} holds {} bytes, expected {} for a {}x{} f32 image",
            path.display(),
            bytes.len(),
            expected,
            width,
            height
        );
    }
    let mut data = vec![0f32; width as usize * height as usize];
    bytemuck::cast_slice_mut::<f32, u8>(&mut data).copy_from_slice(&bytes);
    for value in &mut data {
        *value = f32::from_bits(u32::from_le(value.to_bits()));
    }
    let buffer = PixelBuffer::new(width, height, data)
        .with_context(|| format!("building pixel buffer from {}", path.display()))?;
    Ok(InMemorySource::new(buffer))
}

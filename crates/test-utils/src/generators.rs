//! Test data generators for synthetic astronomical images.
//!
//! All generators are deterministic: the random ones take a seed and use
//! `StdRng`, so a failing test reproduces exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Background level of [`create_star_field`].
pub const SKY_LEVEL: f32 = 100.0;

/// Creates an image where every pixel encodes its position: `row * width + col`.
///
/// # Example
///
/// ```
/// use test_utils::create_numbered_image;
///
/// let img = create_numbered_image(10, 5);
/// assert_eq!(img.len(), 50);
/// assert_eq!(img[12], 12.0); // col=2, row=1
/// ```
pub fn create_numbered_image(width: usize, height: usize) -> Vec<f32> {
    (0..width * height).map(|i| i as f32).collect()
}

/// Creates a horizontal ramp from `lo` (first column) to `hi` (last column).
pub fn create_ramp_image(width: usize, height: usize, lo: f32, hi: f32) -> Vec<f32> {
    let span = (width.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(lo + (hi - lo) * col as f32 / span);
        }
    }
    data
}

/// Creates a star field: a noisy sky background plus Gaussian point sources.
///
/// The sky sits near [`SKY_LEVEL`] with ±5 counts of noise; stars peak between
/// 1 000 and 50 000 counts, which gives the heavy bright tail display stretches
/// are designed for.
pub fn create_star_field(width: usize, height: usize, num_stars: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data: Vec<f32> = (0..width * height)
        .map(|_| SKY_LEVEL + rng.gen_range(-5.0..5.0))
        .collect();

    for _ in 0..num_stars {
        let cx = rng.gen_range(0.0..width.max(1) as f32);
        let cy = rng.gen_range(0.0..height.max(1) as f32);
        let peak = rng.gen_range(1_000.0..50_000.0);
        let sigma: f32 = rng.gen_range(0.8..2.5);
        add_gaussian(&mut data, width, height, cx, cy, peak, sigma);
    }
    data
}

fn add_gaussian(
    data: &mut [f32],
    width: usize,
    height: usize,
    cx: f32,
    cy: f32,
    peak: f32,
    sigma: f32,
) {
    let radius = (sigma * 4.0).ceil() as i64;
    let (icx, icy) = (cx as i64, cy as i64);
    for y in (icy - radius).max(0)..(icy + radius + 1).min(height as i64) {
        for x in (icx - radius).max(0)..(icx + radius + 1).min(width as i64) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let v = peak * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
            data[y as usize * width + x as usize] += v;
        }
    }
}

/// Creates uniformly random values in `[lo, hi)`.
pub fn create_random_image(len: usize, lo: f32, hi: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(lo..hi)).collect()
}

/// Overwrites a rectangle with NaN, as masked or saturated detector areas are.
pub fn punch_nan_hole(
    data: &mut [f32],
    width: usize,
    x: usize,
    y: usize,
    hole_width: usize,
    hole_height: usize,
) {
    let height = data.len() / width.max(1);
    for row in y..(y + hole_height).min(height) {
        for col in x..(x + hole_width).min(width) {
            data[row * width + col] = f32::NAN;
        }
    }
}

/// Sprinkles `NaN`, `+inf` and `-inf` at random positions.
pub fn sprinkle_non_finite(data: &mut [f32], count: usize, seed: u64) {
    if data.is_empty() {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let specials = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY];
    for i in 0..count {
        let idx = rng.gen_range(0..data.len());
        data[idx] = specials[i % specials.len()];
    }
}

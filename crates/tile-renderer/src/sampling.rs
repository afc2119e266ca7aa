//! Image-wide samples for resolving scale limits.
//!
//! Limits are resolved once per (image, scale) and shared by every tile, so
//! adjacent tiles never disagree about `vmin`/`vmax`. Small images are read
//! whole. Larger ones are sampled as a regular lattice of square windows.

use tile_common::{FetchError, PixelRegion, PixelSource};
use tracing::{debug, warn};

/// Collect samples from `source` for scale preparation.
///
/// An image of at most `window² · max_windows` pixels is fetched in one piece.
/// Otherwise up to `max_windows` windows of `window` x `window` pixels are
/// fetched from the centres of a square lattice of cells. Windows that fail to
/// fetch or return the wrong number of samples are skipped; if every window is
/// skipped the last failure is returned, so the caller can retry later instead
/// of resolving limits from nothing.
pub fn collect_scale_samples(
    source: &dyn PixelSource,
    image_width: u32,
    image_height: u32,
    window: u32,
    max_windows: usize,
) -> Result<Vec<f32>, FetchError> {
    if image_width == 0 || image_height == 0 {
        return Ok(Vec::new());
    }

    let window = window.max(1);
    let max_windows = max_windows.max(1);
    let budget = (window as usize).pow(2) * max_windows;
    let total = image_width as usize * image_height as usize;

    let regions = if total <= budget {
        vec![PixelRegion::new(0, 0, image_width, image_height)]
    } else {
        sample_regions(image_width, image_height, window, max_windows)
    };

    let mut samples = Vec::with_capacity(regions.iter().map(|r| r.len()).sum());
    let mut skipped = 0usize;
    let mut last_error = None;
    for region in &regions {
        match source.fetch(*region) {
            Ok(values) if values.len() == region.len() => samples.extend_from_slice(&values),
            Ok(values) => {
                warn!(
                    region = %region,
                    expected = region.len(),
                    actual = values.len(),
                    "Skipping statistics window with wrong sample count"
                );
                skipped += 1;
                last_error = Some(FetchError::new(
                    *region,
                    format!("expected {} samples, got {}", region.len(), values.len()),
                ));
            }
            Err(e) => {
                warn!(region = %region, error = %e, "Skipping statistics window");
                skipped += 1;
                last_error = Some(e);
            }
        }
    }

    if samples.is_empty() {
        if let Some(e) = last_error {
            return Err(e);
        }
    }

    debug!(
        windows = regions.len(),
        skipped,
        samples = samples.len(),
        "Collected scale samples"
    );
    Ok(samples)
}

/// Window rectangles centred in a `g` x `g` lattice of cells, `g = floor(√max_windows)`.
fn sample_regions(image_width: u32, image_height: u32, window: u32, max_windows: usize) -> Vec<PixelRegion> {
    let per_side = ((max_windows as f64).sqrt().floor() as u32).max(1);
    let cols = per_side.min(image_width);
    let rows = per_side.min(image_height);
    let cell_w = image_width / cols;
    let cell_h = image_height / rows;
    let win_w = window.min(cell_w).max(1);
    let win_h = window.min(cell_h).max(1);

    let mut regions = Vec::with_capacity(cols as usize * rows as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x = col * cell_w + (cell_w - win_w) / 2;
            let y = row * cell_h + (cell_h - win_h) / 2;
            regions.push(PixelRegion::new(x, y, win_w, win_h));
        }
    }
    regions
}

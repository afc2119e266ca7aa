//! IRAF zscale display-range estimator.
//!
//! Samples the finite data, sorts the sample, fits a line to sample value versus
//! rank with iterative sigma clipping, and derives the display range from the
//! fitted slope around the median:
//!
//! ```text
//! z1 = median - (n/2) · slope / contrast
//! z2 = median + (n/2) · slope / contrast
//! ```
//!
//! The result is clamped to the data range, and falls back to the full data range
//! when the fit degenerates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScaleError};
use crate::limits::finite_min_max;

/// Default contrast.
pub const DEFAULT_CONTRAST: f64 = 0.25;
/// Default maximum sample count.
pub const DEFAULT_NUM_SAMPLES: usize = 1000;
/// Default number of sigma-clipping iterations.
pub const DEFAULT_ITERATIONS: usize = 5;
/// Residuals at or beyond this many standard deviations are rejected.
pub const CLIP_SIGMA: f64 = 2.5;

/// Knobs of the zscale estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZscaleSettings {
    pub contrast: f64,
    pub num_samples: usize,
    pub iterations: usize,
}

impl Default for ZscaleSettings {
    fn default() -> Self {
        Self {
            contrast: DEFAULT_CONTRAST,
            num_samples: DEFAULT_NUM_SAMPLES,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl ZscaleSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.contrast.is_finite() && self.contrast > 0.0) {
            return Err(ScaleError::invalid(
                "contrast",
                format!("must be a positive finite number, got {}", self.contrast),
            ));
        }
        if self.num_samples == 0 {
            return Err(ScaleError::invalid("num_samples", "must be at least 1"));
        }
        Ok(())
    }
}

/// Least-squares line `y = intercept + slope · x`.
#[derive(Debug, Clone, Copy)]
struct Line {
    intercept: f64,
    slope: f64,
}

impl Line {
    fn fit(xs: &[f64], ys: &[f64]) -> Option<Line> {
        let n = xs.len();
        if n < 2 {
            return None;
        }
        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }
        if sxx == 0.0 {
            return None;
        }
        let slope = sxy / sxx;
        Some(Line {
            intercept: mean_y - slope * mean_x,
            slope,
        })
    }

    fn eval(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Take up to `num_samples` finite values at an even stride through the data.
fn sample_finite(data: &[f32], num_samples: usize) -> Vec<f64> {
    let finite_count = data.iter().filter(|v| v.is_finite()).count();
    if finite_count == 0 {
        return Vec::new();
    }
    let stride = finite_count.div_ceil(num_samples).max(1);
    data.iter()
        .filter(|v| v.is_finite())
        .step_by(stride)
        .take(num_samples)
        .map(|&v| v as f64)
        .collect()
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Compute the zscale display limits `(z1, z2)`.
///
/// Always returns `data_min <= z1 <= z2 <= data_max` over the finite data. With no
/// finite data at all the result is `(0.0, 1.0)`.
pub fn zscale_limits(data: &[f32], settings: &ZscaleSettings) -> (f64, f64) {
    let Some((data_min, data_max)) = finite_min_max(data) else {
        return (0.0, 1.0);
    };

    let mut samples = sample_finite(data, settings.num_samples.max(1));
    samples.sort_by(f64::total_cmp);
    let n = samples.len();
    if n < 2 {
        return (data_min, data_max);
    }

    let mut xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let mut ys = samples;

    let Some(mut line) = Line::fit(&xs, &ys) else {
        return (data_min, data_max);
    };

    for _ in 0..settings.iterations {
        let residuals: Vec<f64> = xs.iter().zip(&ys).map(|(x, y)| y - line.eval(*x)).collect();
        let mean = residuals.iter().sum::<f64>() / residuals.len() as f64;
        let variance =
            residuals.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / residuals.len() as f64;
        let sigma = variance.sqrt();
        if sigma == 0.0 {
            // Exact fit; nothing left to clip.
            break;
        }

        let threshold = CLIP_SIGMA * sigma;
        let (kept_x, kept_y): (Vec<f64>, Vec<f64>) = xs
            .iter()
            .zip(&ys)
            .zip(&residuals)
            .filter(|(_, r)| r.abs() < threshold)
            .map(|((x, y), _)| (*x, *y))
            .unzip();

        if kept_x.len() < 2 {
            debug!(survivors = kept_x.len(), "zscale clipping rejected the sample");
            return (data_min, data_max);
        }
        let converged = kept_x.len() == xs.len();
        xs = kept_x;
        ys = kept_y;
        match Line::fit(&xs, &ys) {
            Some(refit) => line = refit,
            None => return (data_min, data_max),
        }
        if converged {
            break;
        }
    }

    // ys stays sorted: filtering preserves order.
    let median = median_of_sorted(&ys);
    let half_span = (n as f64 / 2.0) * line.slope / settings.contrast;

    let z1 = (median - half_span).max(data_min);
    let z2 = (median + half_span).min(data_max);

    if !(z1 < z2) {
        return (data_min, data_max);
    }
    (z1, z2)
}

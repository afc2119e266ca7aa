//! Display-range (vmin/vmax) estimation over finite samples.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScaleError};
use crate::zscale::{zscale_limits, ZscaleSettings};

/// Default lower percentile for [`LimitsMode::Percentile`].
pub const DEFAULT_PERCENTILE_LOW: f64 = 0.25;
/// Default upper percentile for [`LimitsMode::Percentile`].
pub const DEFAULT_PERCENTILE_HIGH: f64 = 99.75;

/// How absent `vmin`/`vmax` values are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LimitsMode {
    /// Finite minimum and maximum.
    #[default]
    MinMax,
    /// zscale estimator with default knobs.
    ZScale,
    /// Percentile clip, in percent.
    Percentile { low: f64, high: f64 },
}

impl LimitsMode {
    pub fn percentile() -> Self {
        Self::Percentile {
            low: DEFAULT_PERCENTILE_LOW,
            high: DEFAULT_PERCENTILE_HIGH,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Self::Percentile { low, high } = *self {
            let in_range = |p: f64| (0.0..=100.0).contains(&p);
            if !in_range(low) || !in_range(high) {
                return Err(ScaleError::invalid(
                    "percentile",
                    format!("percentiles must lie in [0, 100], got {low}..{high}"),
                ));
            }
            if low > high {
                return Err(ScaleError::invalid(
                    "percentile",
                    format!("low percentile {low} exceeds high percentile {high}"),
                ));
            }
        }
        Ok(())
    }
}

/// Minimum and maximum over the finite values, or `None` if there are none.
pub fn finite_min_max(data: &[f32]) -> Option<(f64, f64)> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut seen = false;
    for &v in data {
        if v.is_finite() {
            seen = true;
            min = min.min(v);
            max = max.max(v);
        }
    }
    seen.then_some((min as f64, max as f64))
}

/// Percentile limits over the finite values (linear interpolation between order
/// statistics), or `None` if there are no finite values.
pub fn percentile_limits(data: &[f32], low: f64, high: f64) -> Option<(f64, f64)> {
    let mut finite: Vec<f64> = data
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    Some((
        interpolate_percentile(&finite, low),
        interpolate_percentile(&finite, high),
    ))
}

fn interpolate_percentile(sorted: &[f64], percent: f64) -> f64 {
    let last = sorted.len() - 1;
    let pos = (percent.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper.min(last)] - sorted[lower]) * frac
}

/// Resolve display limits for a set of samples using `mode`.
///
/// Returns `None` when the samples contain no finite value.
pub fn image_limits(samples: &[f32], mode: LimitsMode) -> Option<(f64, f64)> {
    match mode {
        LimitsMode::MinMax => finite_min_max(samples),
        LimitsMode::ZScale => {
            finite_min_max(samples)?;
            Some(zscale_limits(samples, &ZscaleSettings::default()))
        }
        LimitsMode::Percentile { low, high } => percentile_limits(samples, low, high),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_min_max_ignores_non_finite() {
        let data = [f32::NAN, 3.0, f32::INFINITY, -2.0, f32::NEG_INFINITY, 7.5];
        assert_eq!(finite_min_max(&data), Some((-2.0, 7.5)));
        assert_eq!(finite_min_max(&[f32::NAN, f32::NAN]), None);
        assert_eq!(finite_min_max(&[]), None);
    }

    #[test]
    fn test_percentile_interpolates() {
        let data: Vec<f32> = (0..=100).map(|i| i as f32).collect();
        let (lo, hi) = percentile_limits(&data, 0.25, 99.75).unwrap();
        assert!((lo - 0.25).abs() < 1e-9);
        assert!((hi - 99.75).abs() < 1e-9);
        assert_eq!(percentile_limits(&data, 0.0, 100.0), Some((0.0, 100.0)));
    }

    #[test]
    fn test_percentile_validation() {
        assert!(LimitsMode::Percentile { low: 90.0, high: 10.0 }
            .validate()
            .is_err());
        assert!(LimitsMode::Percentile {
            low: -1.0,
            high: 10.0
        }
        .validate()
        .is_err());
        assert!(LimitsMode::percentile().validate().is_ok());
    }

    #[test]
    fn test_image_limits_no_finite() {
        let data = [f32::NAN; 4];
        assert_eq!(image_limits(&data, LimitsMode::MinMax), None);
        assert_eq!(image_limits(&data, LimitsMode::ZScale), None);
        assert_eq!(image_limits(&data, LimitsMode::percentile()), None);
    }
}

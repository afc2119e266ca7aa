//! Cumulative histogram used by histogram equalization.

/// Normalized cumulative distribution of finite samples over `[lo, hi]`.
///
/// Samples are clipped to the range before binning; a sample then maps to the
/// fraction of samples that fall in its bin or below.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramCdf {
    lo: f64,
    hi: f64,
    cdf: Vec<f64>,
}

impl HistogramCdf {
    /// Build the CDF. Returns `None` for an empty range, zero bins or no finite
    /// samples; callers map every value to `0` in that case.
    pub fn build(samples: &[f32], lo: f64, hi: f64, bins: usize) -> Option<Self> {
        if bins == 0 || !(lo.is_finite() && hi.is_finite()) || lo >= hi {
            return None;
        }

        let mut counts = vec![0u64; bins];
        let mut total = 0u64;
        for &v in samples {
            if !v.is_finite() {
                continue;
            }
            counts[bin_index(v as f64, lo, hi, bins)] += 1;
            total += 1;
        }
        if total == 0 {
            return None;
        }

        let mut running = 0u64;
        let cdf = counts
            .into_iter()
            .map(|c| {
                running += c;
                running as f64 / total as f64
            })
            .collect();
        Some(Self { lo, hi, cdf })
    }

    pub fn bins(&self) -> usize {
        self.cdf.len()
    }

    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Map a finite value through the CDF. Non-finite values map to `0`.
    #[inline]
    pub fn lookup(&self, v: f64) -> f64 {
        if !v.is_finite() {
            return 0.0;
        }
        self.cdf[bin_index(v, self.lo, self.hi, self.cdf.len())]
    }
}

#[inline]
fn bin_index(v: f64, lo: f64, hi: f64, bins: usize) -> usize {
    let t = (v.clamp(lo, hi) - lo) / (hi - lo);
    ((t * bins as f64) as usize).min(bins - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_inputs() {
        assert!(HistogramCdf::build(&[1.0, 2.0], 1.0, 1.0, 16).is_none());
        assert!(HistogramCdf::build(&[1.0, 2.0], 0.0, 4.0, 0).is_none());
        assert!(HistogramCdf::build(&[f32::NAN, f32::INFINITY], 0.0, 4.0, 16).is_none());
    }

    #[test]
    fn test_uniform_samples_map_linearly() {
        let samples: Vec<f32> = (0..4).map(|i| i as f32).collect();
        let cdf = HistogramCdf::build(&samples, 0.0, 4.0, 4).unwrap();
        assert_eq!(cdf.lookup(0.0), 0.25);
        assert_eq!(cdf.lookup(1.0), 0.5);
        assert_eq!(cdf.lookup(3.0), 1.0);
        assert_eq!(cdf.lookup(f64::NAN), 0.0);
    }

    #[test]
    fn test_out_of_range_values_are_clipped() {
        let cdf = HistogramCdf::build(&[-10.0, 0.5, 10.0], 0.0, 1.0, 8).unwrap();
        // -10 lands in the first bin, 10 in the last.
        assert!((cdf.lookup(-100.0) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(cdf.lookup(100.0), 1.0);
    }
}

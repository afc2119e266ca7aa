//! Resolved scale mappings.

use rayon::prelude::*;
use tracing::debug;

use crate::algorithm::{clamp_unit, ScaleAlgorithm};
use crate::error::Result;
use crate::histogram::HistogramCdf;
use crate::limits::image_limits;
use crate::params::ScaleParameters;
use crate::zscale::zscale_limits;

/// Buffers at least this long are mapped in parallel.
const PARALLEL_THRESHOLD: usize = 64 * 1024;
const PARALLEL_CHUNK: usize = 16 * 1024;

/// A scale with every data-dependent quantity frozen.
///
/// Mapping never fails and never looks at more than one value at a time, so one
/// prepared scale can be shared (behind an `Arc`) by every tile and worker.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedScale {
    algorithm: ScaleAlgorithm,
    vmin: f64,
    vmax: f64,
    cdf: Option<HistogramCdf>,
}

impl PreparedScale {
    pub fn algorithm(&self) -> &ScaleAlgorithm {
        &self.algorithm
    }

    /// The resolved `(vmin, vmax)`.
    pub fn limits(&self) -> (f64, f64) {
        (self.vmin, self.vmax)
    }

    /// Map a single raw value into `[0, 1]`.
    #[inline]
    pub fn map_value(&self, v: f32) -> f32 {
        if !v.is_finite() {
            return 0.0;
        }
        let v = v as f64;
        let out = match self.algorithm {
            ScaleAlgorithm::HistogramEqualization { .. } => {
                self.cdf.as_ref().map_or(0.0, |cdf| cdf.lookup(v))
            }
            _ => {
                if self.vmax == self.vmin {
                    return 0.0;
                }
                let t = clamp_unit((v - self.vmin) / (self.vmax - self.vmin));
                self.algorithm.stretch(t)
            }
        };
        clamp_unit(out) as f32
    }

    /// Map a buffer, returning a new buffer of the same length.
    pub fn apply(&self, data: &[f32]) -> Vec<f32> {
        let mut out = data.to_vec();
        self.apply_in_place(&mut out);
        out
    }

    /// Map a buffer in place.
    pub fn apply_in_place(&self, data: &mut [f32]) {
        if data.len() >= PARALLEL_THRESHOLD {
            data.par_chunks_mut(PARALLEL_CHUNK).for_each(|chunk| {
                for v in chunk {
                    *v = self.map_value(*v);
                }
            });
        } else {
            for v in data.iter_mut() {
                *v = self.map_value(*v);
            }
        }
    }
}

/// Resolve limits (and the histogram CDF) for `params` from `samples`.
///
/// `samples` may be the whole buffer or a representative subset of a larger image;
/// non-finite samples are ignored. Explicit `vmin`/`vmax` win over data-derived
/// limits, except for zscale which always computes its own range.
pub fn prepare_scale(samples: &[f32], params: &ScaleParameters) -> Result<PreparedScale> {
    params.validate()?;

    let (vmin, vmax) = match params.algorithm {
        ScaleAlgorithm::Zscale(settings) => zscale_limits(samples, &settings),
        _ => {
            let resolved = if params.vmin.is_some() && params.vmax.is_some() {
                None
            } else {
                image_limits(samples, params.limits)
            };
            // No finite data and no explicit limits: an empty range, all zeros.
            let (auto_min, auto_max) = resolved.unwrap_or((0.0, 0.0));
            (params.vmin.unwrap_or(auto_min), params.vmax.unwrap_or(auto_max))
        }
    };

    let cdf = match params.algorithm {
        ScaleAlgorithm::HistogramEqualization { bins } => {
            HistogramCdf::build(samples, vmin, vmax, bins)
        }
        _ => None,
    };

    debug!(
        algorithm = params.algorithm.name(),
        vmin,
        vmax,
        samples = samples.len(),
        "Prepared scale"
    );

    Ok(PreparedScale {
        algorithm: params.algorithm,
        vmin,
        vmax,
        cdf,
    })
}

/// One-shot scaling: prepare from `data` itself and map it.
pub fn apply_scale(data: &[f32], params: &ScaleParameters) -> Result<Vec<f32>> {
    Ok(prepare_scale(data, params)?.apply(data))
}

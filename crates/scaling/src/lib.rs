//! Intensity scaling for astronomical image display.
//!
//! Maps raw floating-point samples to the normalized `[0, 1]` range using one of
//! the classic display stretches. Non-finite samples never influence the computed
//! limits and always map to `0`.
//!
//! Scaling is split in two phases so that every tile of an image shares one mapping:
//!
//! ```text
//! samples ──► prepare_scale(params) ──► PreparedScale { vmin, vmax, cdf }
//!                                              │
//!                     tile buffer ──► apply ───┴──► normalized tile
//! ```
//!
//! [`apply_scale`] is the one-shot form: it prepares from the buffer itself.

pub mod algorithm;
pub mod error;
pub mod histogram;
pub mod limits;
pub mod params;
pub mod prepared;
pub mod zscale;

pub use algorithm::ScaleAlgorithm;
pub use error::{Result, ScaleError};
pub use histogram::HistogramCdf;
pub use limits::{finite_min_max, image_limits, percentile_limits, LimitsMode};
pub use params::ScaleParameters;
pub use prepared::{apply_scale, prepare_scale, PreparedScale};
pub use zscale::{zscale_limits, ZscaleSettings};

//! Scale algorithm definitions.
//!
//! Each variant carries its own knobs, so an algorithm value is always complete
//! and the per-value transform is a single exhaustive `match`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScaleError};
use crate::zscale::ZscaleSettings;

/// Default softening constant for `log`.
pub const DEFAULT_LOG_A: f64 = 1000.0;
/// Default softening constant for `sinh`.
pub const DEFAULT_SINH_A: f64 = 1.0;
/// Default softening constant for `asinh`.
pub const DEFAULT_ASINH_A: f64 = 0.1;
/// Default exponent for `power`.
pub const DEFAULT_POWER_EXPONENT: f64 = 2.0;
/// Default number of histogram bins for histogram equalization.
pub const DEFAULT_HISTOGRAM_BINS: usize = 65536;

fn default_log_a() -> f64 {
    DEFAULT_LOG_A
}

fn default_sinh_a() -> f64 {
    DEFAULT_SINH_A
}

fn default_asinh_a() -> f64 {
    DEFAULT_ASINH_A
}

fn default_exponent() -> f64 {
    DEFAULT_POWER_EXPONENT
}

fn default_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

/// A display stretch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScaleAlgorithm {
    /// `(x - vmin) / (vmax - vmin)`
    Linear,
    /// `log10(a·t + 1) / log10(a + 1)`
    Log {
        #[serde(default = "default_log_a")]
        a: f64,
    },
    /// `sqrt(t)`
    Sqrt,
    /// `t^exponent`
    Power {
        #[serde(default = "default_exponent")]
        exponent: f64,
    },
    /// `sinh(a·t) / sinh(a)`
    Sinh {
        #[serde(default = "default_sinh_a")]
        a: f64,
    },
    /// `asinh(t/a) / asinh(1/a)`: linear near zero, logarithmic for bright values.
    Asinh {
        #[serde(default = "default_asinh_a")]
        a: f64,
    },
    /// Map samples through the normalized cumulative histogram.
    #[serde(rename = "histequ", alias = "histogram_equalization")]
    HistogramEqualization {
        #[serde(default = "default_bins")]
        bins: usize,
    },
    /// IRAF zscale display range, then linear.
    Zscale(ZscaleSettings),
}

impl Default for ScaleAlgorithm {
    fn default() -> Self {
        Self::Linear
    }
}

impl ScaleAlgorithm {
    pub fn log() -> Self {
        Self::Log { a: DEFAULT_LOG_A }
    }

    pub fn power() -> Self {
        Self::Power {
            exponent: DEFAULT_POWER_EXPONENT,
        }
    }

    pub fn sinh() -> Self {
        Self::Sinh { a: DEFAULT_SINH_A }
    }

    pub fn asinh() -> Self {
        Self::Asinh { a: DEFAULT_ASINH_A }
    }

    pub fn histogram_equalization() -> Self {
        Self::HistogramEqualization {
            bins: DEFAULT_HISTOGRAM_BINS,
        }
    }

    pub fn zscale() -> Self {
        Self::Zscale(ZscaleSettings::default())
    }

    /// Every algorithm with its default knobs.
    pub fn all() -> [ScaleAlgorithm; 8] {
        [
            Self::Linear,
            Self::log(),
            Self::Sqrt,
            Self::power(),
            Self::sinh(),
            Self::asinh(),
            Self::histogram_equalization(),
            Self::zscale(),
        ]
    }

    /// Short name used in menus and preference files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log { .. } => "log",
            Self::Sqrt => "sqrt",
            Self::Power { .. } => "power",
            Self::Sinh { .. } => "sinh",
            Self::Asinh { .. } => "asinh",
            Self::HistogramEqualization { .. } => "histequ",
            Self::Zscale(_) => "zscale",
        }
    }

    /// Parse a name (case-insensitive) into the algorithm with default knobs.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "log" => Ok(Self::log()),
            "sqrt" => Ok(Self::Sqrt),
            "power" | "pow" => Ok(Self::power()),
            "sinh" => Ok(Self::sinh()),
            "asinh" => Ok(Self::asinh()),
            "histequ" | "histogram" | "histogram_equalization" => {
                Ok(Self::histogram_equalization())
            }
            "zscale" => Ok(Self::zscale()),
            other => Err(ScaleError::UnknownAlgorithm(other.to_string())),
        }
    }

    /// Check the algorithm knobs. Called before any computation.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Linear | Self::Sqrt => Ok(()),
            Self::Log { a } => {
                require_positive("a", a)?;
                Ok(())
            }
            Self::Power { exponent } => {
                if !exponent.is_finite() {
                    return Err(ScaleError::invalid("exponent", "must be finite"));
                }
                Ok(())
            }
            Self::Sinh { a } | Self::Asinh { a } => require_positive("a", a),
            Self::HistogramEqualization { bins } => {
                if bins == 0 {
                    return Err(ScaleError::invalid("bins", "must be at least 1"));
                }
                Ok(())
            }
            Self::Zscale(settings) => settings.validate(),
        }
    }

    /// Apply the stretch to an already linearly normalized value `t` in `[0, 1]`.
    ///
    /// Histogram equalization and zscale have no pointwise stretch of their own;
    /// for them this is the identity.
    pub fn stretch(&self, t: f64) -> f64 {
        let out = match *self {
            Self::Linear | Self::HistogramEqualization { .. } | Self::Zscale(_) => t,
            Self::Log { a } => (a * t + 1.0).log10() / (a + 1.0).log10(),
            Self::Sqrt => t.sqrt(),
            Self::Power { exponent } => t.powf(exponent),
            Self::Sinh { a } => (a * t).sinh() / a.sinh(),
            Self::Asinh { a } => (t / a).asinh() / (1.0 / a).asinh(),
        };
        clamp_unit(out)
    }

    /// True when absent limits cannot be taken from the parameters alone.
    pub fn needs_samples(&self) -> bool {
        matches!(self, Self::HistogramEqualization { .. } | Self::Zscale(_))
    }
}

fn require_positive(param: &'static str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ScaleError::invalid(
            param,
            format!("must be a positive finite number, got {value}"),
        ));
    }
    Ok(())
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[inline]
pub(crate) fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

//! User-facing scale configuration.

use serde::{Deserialize, Serialize};

use crate::algorithm::ScaleAlgorithm;
use crate::error::{Result, ScaleError};
use crate::limits::LimitsMode;

/// Algorithm plus optional explicit display limits.
///
/// Absent limits are resolved from data by [`crate::prepare_scale`] according to
/// `limits`. Zscale always computes its own range and ignores `vmin`/`vmax`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParameters {
    pub algorithm: ScaleAlgorithm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmax: Option<f64>,
    pub limits: LimitsMode,
}

impl ScaleParameters {
    pub fn new(algorithm: ScaleAlgorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }

    pub fn with_limits(mut self, vmin: f64, vmax: f64) -> Self {
        self.vmin = Some(vmin);
        self.vmax = Some(vmax);
        self
    }

    pub fn with_limits_mode(mut self, limits: LimitsMode) -> Self {
        self.limits = limits;
        self
    }

    /// Validate the algorithm knobs and any explicit limits.
    pub fn validate(&self) -> Result<()> {
        self.algorithm.validate()?;
        self.limits.validate()?;
        for (param, value) in [("vmin", self.vmin), ("vmax", self.vmax)] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ScaleError::invalid(param, format!("must be finite, got {v}")));
                }
            }
        }
        Ok(())
    }

    /// True when preparing this scale requires looking at image data.
    pub fn needs_samples(&self) -> bool {
        self.algorithm.needs_samples() || self.vmin.is_none() || self.vmax.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_samples() {
        let explicit = ScaleParameters::new(ScaleAlgorithm::Linear).with_limits(0.0, 1.0);
        assert!(!explicit.needs_samples());
        assert!(ScaleParameters::default().needs_samples());
        assert!(ScaleParameters::new(ScaleAlgorithm::zscale())
            .with_limits(0.0, 1.0)
            .needs_samples());
    }

    #[test]
    fn test_rejects_non_finite_limits() {
        let params = ScaleParameters::default().with_limits(f64::NAN, 1.0);
        assert!(matches!(
            params.validate(),
            Err(ScaleError::InvalidParameter { param: "vmin", .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_preferences() {
        let params = ScaleParameters::new(ScaleAlgorithm::asinh())
            .with_limits_mode(LimitsMode::percentile());
        let json = serde_json::to_string(&params).unwrap();
        assert!(!json.contains("vmin"));
        let back: ScaleParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);

        let partial: ScaleParameters = serde_json::from_str(r#"{"vmax": 10.0}"#).unwrap();
        assert_eq!(partial.algorithm, ScaleAlgorithm::Linear);
        assert_eq!(partial.vmax, Some(10.0));
        assert_eq!(partial.limits, LimitsMode::MinMax);
    }
}

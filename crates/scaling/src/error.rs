//! Error types for scaling.

use thiserror::Error;

/// Errors raised while validating scale parameters.
///
/// Validation happens before any pixel is touched; a successfully prepared scale
/// never fails while mapping values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScaleError {
    #[error("invalid value for '{param}': {message}")]
    InvalidParameter { param: &'static str, message: String },

    #[error("unknown scale algorithm: {0}")]
    UnknownAlgorithm(String),
}

impl ScaleError {
    pub fn invalid(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param,
            message: message.into(),
        }
    }
}

/// Result type for scaling operations.
pub type Result<T> = std::result::Result<T, ScaleError>;

//! Error types for colormap handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColormapError {
    #[error("Invalid colors: {0}")]
    InvalidColors(String),

    #[error("Invalid LUT size {0}: must be at least 2")]
    InvalidLutSize(usize),

    #[error("LUT parse error on line {line}: {message}")]
    LutParse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ColormapError {
    pub fn lut_parse(line: usize, message: impl Into<String>) -> Self {
        Self::LutParse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ColormapError>;

//! Error types for texture cache operations.

use thiserror::Error;

use crate::backend::GpuError;

#[derive(Debug, Error, PartialEq)]
pub enum TextureError {
    #[error("GPU context not ready: call initialize() first")]
    ContextNotReady,

    #[error("Texture not found: {0}")]
    NotFound(String),

    #[error("Invalid pixel data: {0}")]
    InvalidPixelData(String),

    #[error("Texture '{key}' needs {size} bytes, more than the whole {max_bytes}-byte budget")]
    ExceedsBudget {
        key: String,
        size: usize,
        max_bytes: usize,
    },

    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

impl TextureError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidPixelData(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TextureError>;

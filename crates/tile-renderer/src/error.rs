//! Error types for tile rendering.

use colormap::ColormapError;
use scaling::ScaleError;
use texture_cache::TextureError;
use thiserror::Error;
use tile_common::{FetchError, PixelRegion};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No image attached")]
    NoImage,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Fetch of region {region} returned {actual} samples, expected {expected}")]
    FetchShape {
        region: PixelRegion,
        expected: usize,
        actual: usize,
    },

    #[error("Scale error: {0}")]
    Scale(#[from] ScaleError),

    #[error("Colormap error: {0}")]
    Colormap(#[from] ColormapError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RenderError {
    /// Per-tile failures that are skipped for the current frame and retried on the next.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::FetchShape { .. })
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

//! The host-supplied raw pixel provider.

use crate::region::{PixelBuffer, PixelRegion};
use thiserror::Error;

/// A failed `fetch()` for one region.
///
/// The renderer treats this as recoverable: the affected tile is skipped for the
/// current frame and retried on the next one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("fetch of region {region} failed: {message}")]
pub struct FetchError {
    pub region: PixelRegion,
    pub message: String,
}

impl FetchError {
    pub fn new(region: PixelRegion, message: impl Into<String>) -> Self {
        Self {
            region,
            message: message.into(),
        }
    }
}

/// Raw pixel-region provider, supplied once per image attach.
///
/// `fetch` must return exactly `region.width * region.height` samples in row-major
/// order. Implementations must be shareable across threads so tile pixels can be
/// produced off the render thread.
pub trait PixelSource: Send + Sync {
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError>;
}

impl<F> PixelSource for F
where
    F: Fn(PixelRegion) -> Result<Vec<f32>, FetchError> + Send + Sync,
{
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError> {
        self(region)
    }
}

/// A [`PixelSource`] backed by a fully materialised raster.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    buffer: PixelBuffer,
}

impl InMemorySource {
    pub fn new(buffer: PixelBuffer) -> Self {
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }
}

impl PixelSource for InMemorySource {
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError> {
        self.buffer
            .extract(&region)
            .map_err(|e| FetchError::new(region, e.to_string()))
    }
}

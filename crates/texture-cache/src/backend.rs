//! The abstract GPU boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::TextureFormat;

/// Opaque handle of a texture created by a [`GpuBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u32);

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// Failures reported by a backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GpuError {
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),

    #[error("region {width}x{height}+{x}+{y} outside {texture_width}x{texture_height} texture")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        texture_width: u32,
        texture_height: u32,
    },

    #[error("expected {expected} bytes of pixel data, got {actual}")]
    DataLength { expected: usize, actual: usize },

    #[error("out of GPU memory: {0}")]
    OutOfMemory(String),

    #[error("GPU context lost")]
    ContextLost,
}

/// The three calls the texture cache needs from a graphics API, plus optional
/// lifecycle and mipmap hooks.
///
/// Implementations are bound to the thread that owns the graphics context.
pub trait GpuBackend {
    /// Create a texture from a full frame of pixel data.
    fn create(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<TextureId, GpuError>;

    /// Overwrite a rectangle of an existing texture.
    fn update_subregion(
        &mut self,
        id: TextureId,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<(), GpuError>;

    /// Release a texture. Unknown ids are ignored.
    fn destroy(&mut self, id: TextureId);

    fn initialize(&mut self) -> Result<(), GpuError> {
        Ok(())
    }

    fn shutdown(&mut self) {}

    fn generate_mipmaps(&mut self, _id: TextureId) -> Result<(), GpuError> {
        Ok(())
    }
}

impl<B: GpuBackend + ?Sized> GpuBackend for Box<B> {
    fn create(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<TextureId, GpuError> {
        (**self).create(width, height, format, data)
    }

    fn update_subregion(
        &mut self,
        id: TextureId,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<(), GpuError> {
        (**self).update_subregion(id, x, y, width, height, data)
    }

    fn destroy(&mut self, id: TextureId) {
        (**self).destroy(id)
    }

    fn initialize(&mut self) -> Result<(), GpuError> {
        (**self).initialize()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }

    fn generate_mipmaps(&mut self, id: TextureId) -> Result<(), GpuError> {
        (**self).generate_mipmaps(id)
    }
}

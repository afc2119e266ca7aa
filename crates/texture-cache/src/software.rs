//! An in-memory GPU backend.
//!
//! Stores texture bytes in host memory and supports read-back. Used for headless
//! frame compositing and in tests.

use std::collections::HashMap;

use crate::backend::{GpuBackend, GpuError, TextureId};
use crate::format::TextureFormat;

/// A texture held by [`SoftwareGpu`].
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareTexture {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
    pub mip_levels: u32,
}

impl SoftwareTexture {
    /// Bytes of the pixel at `(x, y)`, or `None` outside the texture.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bpp;
        self.data.get(start..start + bpp)
    }
}

#[derive(Debug, Default)]
pub struct SoftwareGpu {
    textures: HashMap<TextureId, SoftwareTexture>,
    next_id: u32,
    texture_limit: Option<usize>,
    creates: u64,
    updates: u64,
    destroys: u64,
}

impl SoftwareGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `create` with `OutOfMemory` once `limit` textures are live.
    pub fn with_texture_limit(limit: usize) -> Self {
        Self {
            texture_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn texture(&self, id: TextureId) -> Option<&SoftwareTexture> {
        self.textures.get(&id)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn allocated_bytes(&self) -> usize {
        self.textures.values().map(|t| t.data.len()).sum()
    }

    pub fn create_count(&self) -> u64 {
        self.creates
    }

    pub fn update_count(&self) -> u64 {
        self.updates
    }

    pub fn destroy_count(&self) -> u64 {
        self.destroys
    }
}

impl GpuBackend for SoftwareGpu {
    fn create(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<TextureId, GpuError> {
        let expected = format.byte_size(width, height);
        if data.len() != expected {
            return Err(GpuError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        if let Some(limit) = self.texture_limit {
            if self.textures.len() >= limit {
                return Err(GpuError::OutOfMemory(format!(
                    "{limit} textures already allocated"
                )));
            }
        }

        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(
            id,
            SoftwareTexture {
                width,
                height,
                format,
                data: data.to_vec(),
                mip_levels: 1,
            },
        );
        self.creates += 1;
        Ok(id)
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
        let texture = self
            .textures
            .get_mut(&id)
            .ok_or(GpuError::UnknownTexture(id))?;

        let fits_x = x.checked_add(width).is_some_and(|r| r <= texture.width);
        let fits_y = y.checked_add(height).is_some_and(|b| b <= texture.height);
        if !fits_x || !fits_y {
            return Err(GpuError::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                texture_width: texture.width,
                texture_height: texture.height,
            });
        }

        let bpp = texture.format.bytes_per_pixel();
        let row_bytes = width as usize * bpp;
        let expected = row_bytes * height as usize;
        if data.len() != expected {
            return Err(GpuError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        let stride = texture.width as usize * bpp;
        for (row, src) in data.chunks_exact(row_bytes.max(1)).enumerate() {
            let start = (y as usize + row) * stride + x as usize * bpp;
            texture.data[start..start + row_bytes].copy_from_slice(src);
        }
        self.updates += 1;
        Ok(())
    }

    fn destroy(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_some() {
            self.destroys += 1;
        }
    }

    fn shutdown(&mut self) {
        self.textures.clear();
    }

    fn generate_mipmaps(&mut self, id: TextureId) -> Result<(), GpuError> {
        let texture = self
            .textures
            .get_mut(&id)
            .ok_or(GpuError::UnknownTexture(id))?;
        texture.mip_levels = texture.width.max(texture.height).max(1).ilog2() + 1;
        Ok(())
    }
}

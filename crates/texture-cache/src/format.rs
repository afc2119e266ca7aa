//! Texture pixel formats and upload payloads.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextureError};

/// Pixel layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    /// 8-bit RGBA, the color-mapped tile format.
    #[default]
    Rgba8,
    /// Single-channel 32-bit float, for raw data textures.
    R32F,
    /// Four-channel 32-bit float.
    Rgba32F,
}

impl TextureFormat {
    pub fn channels(&self) -> usize {
        match self {
            Self::Rgba8 | Self::Rgba32F => 4,
            Self::R32F => 1,
        }
    }

    pub fn bytes_per_channel(&self) -> usize {
        match self {
            Self::Rgba8 => 1,
            Self::R32F | Self::Rgba32F => 4,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.channels() * self.bytes_per_channel()
    }

    /// `width · height · channels · bytes_per_channel`
    pub fn byte_size(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}

/// A borrowed pixel payload for texture creation or sub-region update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturePixels<'a> {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: &'a [u8],
}

impl<'a> TexturePixels<'a> {
    pub fn new(width: u32, height: u32, format: TextureFormat, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    pub fn rgba8(width: u32, height: u32, data: &'a [u8]) -> Self {
        Self::new(width, height, TextureFormat::Rgba8, data)
    }

    /// Float payload for `R32F` / `Rgba32F` textures.
    pub fn from_f32(width: u32, height: u32, format: TextureFormat, data: &'a [f32]) -> Self {
        Self::new(width, height, format, bytemuck::cast_slice(data))
    }

    pub fn byte_size(&self) -> usize {
        self.format.byte_size(self.width, self.height)
    }

    /// Check dimensions and that `data` holds exactly one frame of pixels.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TextureError::invalid(format!(
                "empty texture {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.byte_size();
        if self.data.len() != expected {
            return Err(TextureError::invalid(format!(
                "{}x{} {:?} needs {} bytes, got {}",
                self.width,
                self.height,
                self.format,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes() {
        assert_eq!(TextureFormat::Rgba8.byte_size(256, 256), 256 * 256 * 4);
        assert_eq!(TextureFormat::R32F.byte_size(10, 10), 400);
        assert_eq!(TextureFormat::Rgba32F.byte_size(2, 3), 96);
    }

    #[test]
    fn test_from_f32_reinterprets_bytes() {
        let data = [1.0f32, 2.0, 3.0, 4.0];
        let pixels = TexturePixels::from_f32(2, 2, TextureFormat::R32F, &data);
        assert_eq!(pixels.data.len(), 16);
        assert!(pixels.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_length() {
        let data = vec![0u8; 15];
        let err = TexturePixels::rgba8(2, 2, &data).validate().unwrap_err();
        assert!(matches!(err, TextureError::InvalidPixelData(_)));
        assert!(TexturePixels::rgba8(0, 2, &[]).validate().is_err());
    }
}

//! Rectangular float rasters and sub-regions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing or slicing a [`PixelBuffer`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("buffer length {actual} does not match {width}x{height}")]
    LengthMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },

    #[error("region {region} lies outside the {width}x{height} image")]
    OutOfBounds {
        region: PixelRegion,
        width: u32,
        height: u32,
    },
}

/// A pixel rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True when the region fits inside an image of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

impl std::fmt::Display for PixelRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A single-channel float raster in row-major order.
///
/// Samples may be NaN or infinite; those mark invalid pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, RegionError> {
        if data.len() != width as usize * height as usize {
            return Err(RegionError::LengthMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer filled with one value.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Copy out a sub-region.
    pub fn extract(&self, region: &PixelRegion) -> Result<Vec<f32>, RegionError> {
        if !region.fits_within(self.width, self.height) {
            return Err(RegionError::OutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            });
        }

        let stride = self.width as usize;
        let mut out = Vec::with_capacity(region.len());
        for row in region.y..region.bottom() {
            let start = row as usize * stride + region.x as usize;
            out.extend_from_slice(&self.data[start..start + region.width as usize]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: u32, height: u32) -> PixelBuffer {
        let data = (0..width * height).map(|i| i as f32).collect();
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn test_length_mismatch() {
        let err = PixelBuffer::new(4, 4, vec![0.0; 15]).unwrap_err();
        assert_eq!(
            err,
            RegionError::LengthMismatch {
                width: 4,
                height: 4,
                actual: 15
            }
        );
    }

    #[test]
    fn test_extract_interior() {
        let buf = numbered(4, 3);
        let out = buf.extract(&PixelRegion::new(1, 1, 2, 2)).unwrap();
        assert_eq!(out, vec![5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_extract_out_of_bounds() {
        let buf = numbered(4, 3);
        assert!(buf.extract(&PixelRegion::new(3, 0, 2, 1)).is_err());
        assert!(buf.extract(&PixelRegion::new(0, 0, 4, 3)).is_ok());
    }

    #[test]
    fn test_get() {
        let buf = numbered(4, 3);
        assert_eq!(buf.get(3, 2), Some(11.0));
        assert_eq!(buf.get(4, 0), None);
    }

    #[test]
    fn test_region_fits_within_overflow() {
        let region = PixelRegion::new(u32::MAX, 0, 2, 1);
        assert!(!region.fits_within(u32::MAX, 1));
    }
}

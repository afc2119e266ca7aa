//! Pure tile pixel computation: raw samples → normalized → RGBA.
//!
//! Nothing here touches a GPU, so it runs on loader threads and in tests
//! without a graphics context.

use colormap::Lut;
use scaling::PreparedScale;
use tile_common::{PixelRegion, PixelSource};

use crate::error::{RenderError, Result};

/// RGBA8 pixels of one tile, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TileImage {
    pub fn byte_size(&self) -> usize {
        self.rgba.len()
    }
}

/// Scale then colorize `samples` (row-major, `width * height` long).
pub fn compute_tile_pixels(
    width: u32,
    height: u32,
    mut samples: Vec<f32>,
    scale: &PreparedScale,
    lut: &Lut,
) -> TileImage {
    scale.apply_in_place(&mut samples);
    TileImage {
        width,
        height,
        rgba: lut.apply(&samples),
    }
}

/// Fetch `region` from `source`, check its length and compute the tile image.
pub fn fetch_tile_pixels(
    source: &dyn PixelSource,
    region: PixelRegion,
    scale: &PreparedScale,
    lut: &Lut,
) -> Result<TileImage> {
    let samples = source.fetch(region)?;
    if samples.len() != region.len() {
        return Err(RenderError::FetchShape {
            region,
            expected: region.len(),
            actual: samples.len(),
        });
    }
    Ok(compute_tile_pixels(
        region.width,
        region.height,
        samples,
        scale,
        lut,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use colormap::ColormapEngine;
    use scaling::{prepare_scale, ScaleAlgorithm, ScaleParameters};
    use tile_common::FetchError;

    fn linear(vmin: f64, vmax: f64) -> PreparedScale {
        let params = ScaleParameters::new(ScaleAlgorithm::Linear).with_limits(vmin, vmax);
        prepare_scale(&[], &params).unwrap()
    }

    #[test]
    fn test_grey_ramp() {
        let engine = ColormapEngine::default();
        let image = compute_tile_pixels(3, 1, vec![0.0, 10.0, f32::NAN], &linear(0.0, 10.0), engine.lut());
        assert_eq!(image.byte_size(), 12);
        assert_eq!(&image.rgba[0..4], &[0, 0, 0, 255]);
        assert_eq!(&image.rgba[4..8], &[255, 255, 255, 255]);
        // Invalid pixels map to the bottom of the LUT.
        assert_eq!(&image.rgba[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_equal_limits_give_bottom_color() {
        let engine = ColormapEngine::default();
        let image = compute_tile_pixels(2, 1, vec![5.0, 7.0], &linear(5.0, 5.0), engine.lut());
        assert_eq!(image.rgba, vec![0, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_fetch_shape_checked() {
        let engine = ColormapEngine::default();
        let source = |region: PixelRegion| -> std::result::Result<Vec<f32>, FetchError> {
            Ok(vec![0.0; region.len() + 1])
        };
        let err = fetch_tile_pixels(&source, PixelRegion::new(0, 0, 2, 2), &linear(0.0, 1.0), engine.lut())
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::FetchShape {
                expected: 4,
                actual: 5,
                ..
            }
        ));
    }
}

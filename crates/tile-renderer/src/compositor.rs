//! Headless frame compositing from [`SoftwareGpu`] textures.

use colormap::Color;
use texture_cache::{SoftwareGpu, TextureFormat};
use tracing::debug;

use crate::png::create_png;
use crate::renderer::RenderedFrame;

/// An RGBA8 screen image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl CompositedFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]])
    }

    pub fn to_png(&self) -> Result<Vec<u8>, String> {
        create_png(&self.rgba, self.width, self.height)
    }
}

/// Draws a frame's tile quads into a screen-sized buffer, sampling textures
/// nearest-neighbour at the viewport zoom.
#[derive(Debug, Clone, Copy)]
pub struct FrameCompositor {
    background: Color,
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::new(Color::opaque(0, 0, 0))
    }
}

impl FrameCompositor {
    pub fn new(background: Color) -> Self {
        Self { background }
    }

    pub fn composite(&self, frame: &RenderedFrame, gpu: &SoftwareGpu) -> CompositedFrame {
        let (width, height) = frame.viewport.screen_size();
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            rgba.extend_from_slice(&self.background.to_array());
        }

        let zoom = if frame.viewport.zoom > 0.0 {
            frame.viewport.zoom
        } else {
            1.0
        };

        for draw in &frame.draws {
            let Some(texture) = gpu.texture(draw.texture) else {
                debug!(texture = %draw.texture, "Skipping draw of released texture");
                continue;
            };
            if texture.format != TextureFormat::Rgba8 {
                continue;
            }

            let sx0 = draw.screen_x.floor().max(0.0) as u32;
            let sy0 = draw.screen_y.floor().max(0.0) as u32;
            let sx1 = ((draw.screen_x + draw.screen_width).ceil().max(0.0) as u32).min(width);
            let sy1 = ((draw.screen_y + draw.screen_height).ceil().max(0.0) as u32).min(height);

            for sy in sy0..sy1 {
                let v = ((sy as f64 + 0.5 - draw.screen_y) / zoom).floor();
                if v < 0.0 || v >= texture.height as f64 {
                    continue;
                }
                for sx in sx0..sx1 {
                    let u = ((sx as f64 + 0.5 - draw.screen_x) / zoom).floor();
                    if u < 0.0 || u >= texture.width as f64 {
                        continue;
                    }
                    if let Some(texel) = texture.pixel(u as u32, v as u32) {
                        let i = (sy as usize * width as usize + sx as usize) * 4;
                        rgba[i..i + 4].copy_from_slice(texel);
                    }
                }
            }
        }

        CompositedFrame {
            width,
            height,
            rgba,
        }
    }
}

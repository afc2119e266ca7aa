//! Viewport value object.

use serde::{Deserialize, Serialize};

/// The visible window into image space.
///
/// `x`/`y` are the image-space coordinates of the top-left corner, `width`/`height`
/// the extent in image pixels. `zoom` is screen pixels per image pixel.
/// A viewport is supplied fresh by the host every frame and never mutated by the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(x: f64, y: f64, width: f64, height: f64, zoom: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            zoom,
        }
    }

    /// Build the viewport seen by a screen of `screen_width` x `screen_height` pixels
    /// centred on image coordinate (`center_x`, `center_y`) at the given zoom.
    pub fn centered(
        center_x: f64,
        center_y: f64,
        screen_width: u32,
        screen_height: u32,
        zoom: f64,
    ) -> Self {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        let width = screen_width as f64 / zoom;
        let height = screen_height as f64 / zoom;
        Self {
            x: center_x - width / 2.0,
            y: center_y - height / 2.0,
            width,
            height,
            zoom,
        }
    }

    /// Right edge (exclusive) in image coordinates.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive) in image coordinates.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Centre point in image coordinates.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the viewport covers no area (or carries non-finite bounds).
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.x.is_finite() && self.y.is_finite())
    }

    /// Translate by an image-space offset.
    pub fn panned(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Map an image-space point to screen space (origin at the viewport's top-left).
    pub fn to_screen(&self, image_x: f64, image_y: f64) -> (f64, f64) {
        ((image_x - self.x) * self.zoom, (image_y - self.y) * self.zoom)
    }

    /// Screen size covered by this viewport, rounded up.
    pub fn screen_size(&self) -> (u32, u32) {
        let w = (self.width * self.zoom).ceil().max(0.0);
        let h = (self.height * self.zoom).ceil().max(0.0);
        (w as u32, h as u32)
    }
}

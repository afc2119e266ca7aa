//! Tiled rendering of very large images.
//!
//! The image is cut into a [`TileGrid`]; each frame [`TileRenderer::render`]
//! works out which tiles the [`Viewport`](tile_common::Viewport) touches, fetches
//! the raw pixels of any that are missing, maps them through the shared scale and
//! colormap, and uploads them to a byte-budgeted
//! [`TextureCache`](texture_cache::TextureCache).
//!
//! Tile pixel computation ([`compute_tile_pixels`]) is pure and runs either
//! inline or on the background [`TileLoader`]; texture calls always stay on the
//! thread that owns the renderer.

pub mod compositor;
pub mod config;
pub mod error;
pub mod grid;
pub mod loader;
pub mod pixels;
pub mod png;
pub mod renderer;
pub mod sampling;

pub use compositor::{CompositedFrame, FrameCompositor};
pub use config::RendererConfig;
pub use error::{RenderError, Result};
pub use grid::{Tile, TileGrid, TileSpan};
pub use loader::{LoadContext, TileLoader, TileResult};
pub use pixels::{compute_tile_pixels, fetch_tile_pixels, TileImage};
pub use png::create_png;
pub use renderer::{RenderedFrame, TileDraw, TileFailure, TileRenderer};
pub use sampling::collect_scale_samples;

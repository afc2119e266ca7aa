//! Common types shared across the tiled image display crates.
//!
//! - [`Viewport`]: the visible image-space rectangle supplied by the host every frame
//! - [`TileCoord`]: grid coordinates of a tile
//! - [`PixelRegion`] / [`PixelBuffer`]: rectangular float rasters
//! - [`PixelSource`]: the host-supplied `fetch(x, y, w, h)` callback

pub mod region;
pub mod source;
pub mod tile;
pub mod viewport;

pub use region::{PixelBuffer, PixelRegion, RegionError};
pub use source::{FetchError, InMemorySource, PixelSource};
pub use tile::TileCoord;
pub use viewport::Viewport;

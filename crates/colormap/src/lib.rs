//! Colormaps for astronomical image display.
//!
//! Implements:
//! - The built-in palette set (grey, heat, sls, aips0, viridis, ...)
//! - Custom colormaps registered from RGBA arrays or `.lut` files
//! - [`ColormapEngine`]: the active lookup table, with inversion, used to turn
//!   normalized `[0, 1]` samples into RGBA pixels

pub mod builtin;
pub mod color;
pub mod colormap;
pub mod engine;
pub mod error;
pub mod lut_file;
pub mod registry;

pub use builtin::BuiltinColormap;
pub use color::Color;
pub use colormap::Colormap;
pub use engine::{ColormapEngine, Lut, DEFAULT_LUT_SIZE};
pub use error::{ColormapError, Result};
pub use lut_file::{load_lut_file, parse_lut_str, save_lut_file, to_lut_string, LutFormat};
pub use registry::ColormapRegistry;

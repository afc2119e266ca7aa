//! GPU texture cache for tiled image display.
//!
//! [`TextureCache`] maps string keys to textures created through a
//! [`GpuBackend`], keeps the total texture size under a byte budget and evicts
//! least-recently-used entries to make room.
//!
//! ## Context lifecycle
//!
//! The cache starts uninitialized. Every texture operation fails with
//! [`TextureError::ContextNotReady`] until [`TextureCache::initialize`] succeeds;
//! [`TextureCache::shutdown`] releases all textures and returns to that state.
//!
//! ## Threading
//!
//! Textures are bound to the thread that owns the GPU context, so the cache is
//! driven from a single thread. Eviction and insertion happen inside one
//! `&mut self` call and can never over-commit the budget.

pub mod backend;
pub mod cache;
pub mod error;
pub mod format;
pub mod software;

pub use backend::{GpuBackend, GpuError, TextureId};
pub use cache::{TextureCache, TextureCacheStats, TextureEntry};
pub use error::{Result, TextureError};
pub use format::{TextureFormat, TexturePixels};
pub use software::{SoftwareGpu, SoftwareTexture};

//! Configuration for the tile renderer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Runtime tunables of the tile renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Tile edge length in image pixels.
    pub tile_size: u32,

    /// Texture cache budget in bytes.
    pub cache_max_bytes: usize,

    /// Tiles of margin around the visible set loaded by `prefetch`.
    pub prefetch_margin: u32,

    /// Chebyshev distance (in tiles) beyond which `cleanup_distant_tiles` unloads.
    pub cleanup_distance: u32,

    /// Colormap LUT length.
    pub lut_size: usize,

    /// Edge length of each square window sampled for scale statistics.
    pub stats_window: u32,

    /// Maximum number of windows sampled for scale statistics.
    pub max_stat_windows: usize,

    /// Background loader threads; 0 loads tiles synchronously on the render thread.
    pub loader_threads: usize,

    /// Completed tiles that may wait for upload before workers block.
    pub loader_queue_depth: usize,

    /// Generate mipmaps for tile textures.
    pub mipmaps: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            tile_size: 512,
            cache_max_bytes: 512 * 1024 * 1024,
            prefetch_margin: 1,
            cleanup_distance: 3,
            lut_size: 256,
            stats_window: 64,
            max_stat_windows: 256,
            loader_threads: 0,
            loader_queue_depth: 16,
            mipmaps: false,
        }
    }
}

impl RendererConfig {
    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        if let Some(size) = parsed(lookup("TILE_SIZE")) {
            self.tile_size = size;
        }

        if let Some(bytes) =
            parsed::<usize>(lookup("TEXTURE_CACHE_MB")).and_then(|mb| mb.checked_mul(1024 * 1024))
        {
            self.cache_max_bytes = bytes;
        }

        if let Some(margin) = parsed(lookup("PREFETCH_MARGIN")) {
            self.prefetch_margin = margin;
        }

        if let Some(distance) = parsed(lookup("CLEANUP_DISTANCE")) {
            self.cleanup_distance = distance;
        }

        if let Some(size) = parsed(lookup("LUT_SIZE")) {
            self.lut_size = size;
        }

        if let Some(threads) = parsed(lookup("TILE_LOADER_THREADS")) {
            self.loader_threads = threads;
        }

        if let Some(depth) = parsed(lookup("TILE_LOADER_QUEUE_DEPTH")) {
            self.loader_queue_depth = depth;
        }

        self
    }

    /// Parse YAML (or JSON, which YAML accepts) configuration text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| RenderError::Config(e.to_string()))
    }

    /// Load configuration from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RenderError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be > 0".to_string());
        }

        if self.cache_max_bytes == 0 {
            return Err("cache_max_bytes must be > 0".to_string());
        }

        if self.lut_size < 2 {
            return Err("lut_size must be >= 2".to_string());
        }

        if self.stats_window == 0 {
            return Err("stats_window must be > 0".to_string());
        }

        if self.max_stat_windows == 0 {
            return Err("max_stat_windows must be > 0".to_string());
        }

        if self.loader_threads > 0 && self.loader_queue_depth == 0 {
            return Err("loader_queue_depth must be > 0 when loader_threads > 0".to_string());
        }

        Ok(())
    }

    pub fn cache_max_mb(&self) -> usize {
        self.cache_max_bytes / (1024 * 1024)
    }
}

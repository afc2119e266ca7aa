//! The tile renderer: viewport → visible tiles → textures → draw list.
//!
//! # Frame flow
//!
//! ```text
//! render(viewport)
//!   ├─ drain finished background loads → upload (render thread only)
//!   ├─ visible tiles not loaded, or built for an older generation
//!   │    ├─ synchronous: fetch → scale → colormap → create/update texture
//!   │    └─ background: submit to TileLoader, draw what is already resident
//!   └─ one TileDraw per resident visible tile
//! ```
//!
//! Scale and colormap changes bump the render generation. Loaded tiles keep
//! their textures but are stale until refreshed in place with
//! `update_texture`, which happens the next time they are visible.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colormap::{Color, ColormapEngine, Lut};
use scaling::{prepare_scale, PreparedScale, ScaleParameters};
use serde::Serialize;
use texture_cache::{GpuBackend, TextureCache, TextureCacheStats, TextureError, TextureId, TexturePixels};
use tile_common::{PixelRegion, PixelSource, TileCoord, Viewport};
use tracing::{debug, info, warn};

use crate::config::RendererConfig;
use crate::error::{RenderError, Result};
use crate::grid::{Tile, TileGrid};
use crate::loader::{LoadContext, TileLoader, TileResult};
use crate::pixels::{fetch_tile_pixels, TileImage};
use crate::sampling::collect_scale_samples;

/// One textured quad of a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileDraw {
    pub coord: TileCoord,
    pub texture: TextureId,
    /// Image-space pixel rectangle covered by the texture.
    pub region: PixelRegion,
    /// Screen-space placement relative to the viewport's top-left corner.
    pub screen_x: f64,
    pub screen_y: f64,
    pub screen_width: f64,
    pub screen_height: f64,
}

/// A tile that could not be drawn this frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileFailure {
    pub coord: TileCoord,
    pub message: String,
}

/// Result of one `render` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFrame {
    pub viewport: Viewport,
    pub draws: Vec<TileDraw>,
    pub failures: Vec<TileFailure>,
    /// Background loads still in flight.
    pub pending: usize,
    pub generation: u64,
}

impl RenderedFrame {
    fn empty(viewport: Viewport, generation: u64) -> Self {
        Self {
            viewport,
            draws: Vec::new(),
            failures: Vec::new(),
            pending: 0,
            generation,
        }
    }

    /// Every visible tile was drawn.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.pending == 0
    }
}

/// The attached image: grid plus pixel provider.
struct ImageState {
    grid: TileGrid,
    source: Arc<dyn PixelSource>,
}

pub struct TileRenderer<B: GpuBackend> {
    config: RendererConfig,
    cache: TextureCache<B>,
    colormap: ColormapEngine,
    scale_params: ScaleParameters,
    scale: Option<Arc<PreparedScale>>,
    image: Option<ImageState>,
    loader: Option<TileLoader>,
    next_grid_id: u64,
    generation: u64,
}

impl<B: GpuBackend> TileRenderer<B> {
    pub fn new(backend: B, config: RendererConfig) -> Result<Self> {
        config.validate().map_err(RenderError::Config)?;
        let colormap = ColormapEngine::new("grey", config.lut_size)?;
        let loader = if config.loader_threads > 0 {
            Some(TileLoader::new(
                config.loader_threads,
                config.loader_queue_depth,
            )?)
        } else {
            None
        };

        Ok(Self {
            cache: TextureCache::new(backend, config.cache_max_bytes),
            config,
            colormap,
            scale_params: ScaleParameters::default(),
            scale: None,
            image: None,
            loader,
            next_grid_id: 1,
            generation: 1,
        })
    }

    /// Bring up the GPU context.
    pub fn initialize(&mut self) -> Result<()> {
        self.cache.initialize()?;
        Ok(())
    }

    /// Detach the image and tear down the GPU context.
    pub fn shutdown(&mut self) {
        self.clear();
        self.cache.shutdown();
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Image, scale and colormap
    // ------------------------------------------------------------------------

    /// Attach an image, replacing (and releasing) any previous one.
    pub fn set_image(
        &mut self,
        width: u32,
        height: u32,
        source: impl PixelSource + 'static,
    ) -> Result<()> {
        self.set_image_shared(width, height, Arc::new(source))
    }

    /// Attach an image whose source is shared with the caller.
    pub fn set_image_shared(
        &mut self,
        width: u32,
        height: u32,
        source: Arc<dyn PixelSource>,
    ) -> Result<()> {
        self.clear();
        if width == 0 || height == 0 {
            return Err(RenderError::Config(format!(
                "image must be non-empty, got {width}x{height}"
            )));
        }

        let grid_id = self.next_grid_id;
        self.next_grid_id += 1;
        let grid = TileGrid::new(grid_id, width, height, self.config.tile_size);
        info!(
            width,
            height,
            tile_size = self.config.tile_size,
            tiles_x = grid.num_tiles_x(),
            tiles_y = grid.num_tiles_y(),
            "Built tile grid"
        );
        self.image = Some(ImageState { grid, source });
        Ok(())
    }

    /// Detach the image, releasing every tile texture.
    pub fn clear(&mut self) {
        let Some(mut image) = self.image.take() else {
            return;
        };
        let mut released = 0;
        for tile in image.grid.iter_tiles_mut().filter(|t| t.is_loaded()) {
            if self.cache.is_ready() {
                // Only fails when the context is down, checked above.
                let _ = self.cache.delete_texture(tile.texture_key());
            }
            tile.mark_unloaded();
            released += 1;
        }
        // Keys of this grid evicted earlier are irrelevant now.
        self.cache.take_evicted();
        if let Some(loader) = self.loader.as_mut() {
            loader.reset();
        }
        self.scale = None;
        info!(grid_id = image.grid.grid_id(), released, "Tore down tile grid");
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Change the scale. Loaded tiles become stale.
    pub fn set_scale(&mut self, params: ScaleParameters) -> Result<()> {
        params.validate()?;
        if params != self.scale_params {
            self.scale_params = params;
            self.scale = None;
            self.bump_generation("scale");
        }
        Ok(())
    }

    pub fn scale_parameters(&self) -> &ScaleParameters {
        &self.scale_params
    }

    /// The prepared scale shared by all tiles, once resolved.
    pub fn prepared_scale(&self) -> Option<&PreparedScale> {
        self.scale.as_deref()
    }

    /// Select a colormap; unknown names render as grey. Returns whether the name
    /// resolved.
    pub fn set_colormap(&mut self, name: &str) -> bool {
        let before = self.colormap.lut().clone();
        let resolved = self.colormap.set_colormap(name);
        self.bump_if_lut_changed(&before, "colormap");
        resolved
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        let before = self.colormap.lut().clone();
        self.colormap.set_inverted(inverted);
        self.bump_if_lut_changed(&before, "inversion");
    }

    pub fn register_colormap(&mut self, name: &str, colors: Vec<Color>) -> Result<()> {
        let before = self.colormap.lut().clone();
        self.colormap.register_colormap(name, colors)?;
        self.bump_if_lut_changed(&before, "colormap registration");
        Ok(())
    }

    pub fn colormap(&self) -> &ColormapEngine {
        &self.colormap
    }

    /// Current render generation; tiles built for an older one are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump_if_lut_changed(&mut self, before: &Lut, what: &str) {
        if self.colormap.lut() != before {
            self.bump_generation(what);
        }
    }

    fn bump_generation(&mut self, what: &str) {
        self.generation += 1;
        debug!(generation = self.generation, change = what, "Render generation bumped");
    }

    // ------------------------------------------------------------------------
    // Grid queries
    // ------------------------------------------------------------------------

    pub fn grid(&self) -> Option<&TileGrid> {
        self.image.as_ref().map(|i| &i.grid)
    }

    pub fn tile(&self, tx: u32, ty: u32) -> Option<&Tile> {
        self.grid().and_then(|g| g.tile(tx, ty))
    }

    pub fn iter_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.grid().into_iter().flat_map(|g| g.iter_tiles())
    }

    pub fn get_visible_tiles(&self, viewport: &Viewport) -> Vec<&Tile> {
        let Some(grid) = self.grid() else {
            return Vec::new();
        };
        grid.visible_coords(viewport)
            .into_iter()
            .filter_map(|c| grid.get(c))
            .collect()
    }

    /// Visible set grown by `prefetch_margin`, minus visible and loaded tiles.
    pub fn get_prefetch_tiles(&self, viewport: &Viewport) -> Vec<&Tile> {
        let Some(grid) = self.grid() else {
            return Vec::new();
        };
        grid.prefetch_coords(viewport, self.config.prefetch_margin)
            .into_iter()
            .filter_map(|c| grid.get(c))
            .collect()
    }

    pub fn loaded_tile_count(&self) -> usize {
        self.grid().map_or(0, |g| g.loaded_count())
    }

    fn is_stale(&self, tile: &Tile) -> bool {
        tile.is_loaded() && tile.generation() != self.generation
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Load one tile synchronously. No-op when it is loaded and current; a stale
    /// tile is refreshed in place.
    pub fn load_tile(&mut self, coord: TileCoord) -> Result<()> {
        let tile = self
            .grid()
            .ok_or(RenderError::NoImage)?
            .get(coord)
            .ok_or_else(|| RenderError::Config(format!("tile {coord} outside grid")))?;
        if tile.is_loaded() && !self.is_stale(tile) {
            return Ok(());
        }
        let region = tile.region();

        let ctx = self.load_context()?;
        let image = fetch_tile_pixels(ctx.source.as_ref(), region, &ctx.scale, &ctx.lut)?;
        self.upload(coord, image, ctx.generation)
    }

    /// Release one tile's texture. No-op when it is not loaded.
    pub fn unload_tile(&mut self, coord: TileCoord) -> Result<()> {
        let Some(image) = self.image.as_mut() else {
            return Ok(());
        };
        let Some(tile) = image.grid.get_mut(coord) else {
            return Ok(());
        };
        if !tile.is_loaded() {
            return Ok(());
        }
        self.cache.delete_texture(tile.texture_key())?;
        tile.mark_unloaded();
        debug!(tile = %coord, "Unloaded tile");
        Ok(())
    }

    /// Load the prefetch ring around the viewport. Returns how many tiles were
    /// loaded (or queued, with a background loader).
    pub fn prefetch(&mut self, viewport: &Viewport) -> Result<usize> {
        self.ensure_ready()?;
        self.collect_background_loads(viewport);

        let coords: Vec<TileCoord> = self
            .get_prefetch_tiles(viewport)
            .iter()
            .map(|t| t.coord())
            .collect();
        let mut count = 0;
        for coord in coords {
            match self.request_tile(coord) {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => warn!(tile = %coord, error = %e, "Prefetch failed"),
            }
        }
        Ok(count)
    }

    /// Make every visible tile resident and return the draw list.
    ///
    /// Per-tile failures are reported in the frame and retried next frame; only
    /// an uninitialized GPU context fails the whole call.
    pub fn render(&mut self, viewport: &Viewport) -> Result<RenderedFrame> {
        self.ensure_ready()?;
        let mut frame = RenderedFrame::empty(*viewport, self.generation);
        let Some(grid) = self.grid() else {
            return Ok(frame);
        };
        let visible = grid.visible_coords(viewport);

        frame.failures.extend(self.collect_background_loads(viewport));

        for &coord in &visible {
            let needs_load = self
                .grid()
                .and_then(|g| g.get(coord))
                .is_some_and(|t| !t.is_loaded() || self.is_stale(t));
            if !needs_load {
                continue;
            }
            if let Err(e) = self.request_tile(coord) {
                warn!(tile = %coord, error = %e, "Tile load failed, retrying next frame");
                frame.failures.push(TileFailure {
                    coord,
                    message: e.to_string(),
                });
            }
        }

        for &coord in &visible {
            if let Some(draw) = self.draw_tile(coord, viewport)? {
                frame.draws.push(draw);
            }
        }
        self.report_missing_tiles(&visible, &mut frame);

        frame.pending = self.loader.as_ref().map_or(0, |l| l.pending());
        Ok(frame)
    }

    /// Record visible tiles that neither drew, failed nor are loading. They were
    /// evicted by later tiles of the same frame.
    fn report_missing_tiles(&self, visible: &[TileCoord], frame: &mut RenderedFrame) {
        let accounted: HashSet<TileCoord> = frame
            .draws
            .iter()
            .map(|d| d.coord)
            .chain(frame.failures.iter().map(|f| f.coord))
            .collect();
        let missing: Vec<TileCoord> = visible
            .iter()
            .copied()
            .filter(|c| !accounted.contains(c))
            .filter(|c| !self.loader.as_ref().is_some_and(|l| l.is_in_flight(*c)))
            .collect();
        if missing.is_empty() {
            return;
        }

        warn!(
            missing = missing.len(),
            visible = visible.len(),
            max_bytes = self.cache.max_cache_size(),
            "Visible tiles evicted during the frame, texture budget smaller than visible set"
        );
        frame.failures.extend(missing.into_iter().map(|coord| TileFailure {
            coord,
            message: "evicted: texture cache budget smaller than visible set".to_string(),
        }));
    }

    /// Block until background loads settle or `timeout` elapses, uploading
    /// results still wanted by `viewport`. Returns the loads left in flight.
    pub fn finish_pending_loads(&mut self, viewport: &Viewport, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            let Some(loader) = self.loader.as_mut() else {
                return 0;
            };
            if loader.pending() == 0 {
                return 0;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return loader.pending();
            }
            if let Some(result) = loader.recv_timeout(remaining) {
                if let Err(e) = self.accept_result(result, viewport) {
                    warn!(error = %e, "Background tile upload failed");
                }
            }
        }
    }

    /// Unload tiles farther than `distance` tiles (Chebyshev) from the tile under
    /// the viewport centre. Returns how many were unloaded.
    pub fn cleanup_distant_tiles(&mut self, viewport: &Viewport, distance: u32) -> Result<usize> {
        let Some(grid) = self.grid() else {
            return Ok(0);
        };
        let Some(center) = grid.center_tile(viewport) else {
            return Ok(0);
        };
        let distant: Vec<TileCoord> = grid
            .iter_tiles()
            .filter(|t| t.is_loaded() && t.coord().chebyshev_distance(&center) > distance)
            .map(|t| t.coord())
            .collect();

        for &coord in &distant {
            self.unload_tile(coord)?;
        }
        if !distant.is_empty() {
            debug!(center = %center, distance, unloaded = distant.len(), "Cleaned up distant tiles");
        }
        Ok(distant.len())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.cache.is_ready() {
            Ok(())
        } else {
            Err(TextureError::ContextNotReady.into())
        }
    }

    /// Resolve the shared scale if needed and snapshot what a load needs. When
    /// no statistics could be fetched nothing is cached, so the next load retries.
    fn load_context(&mut self) -> Result<LoadContext> {
        let image = self.image.as_ref().ok_or(RenderError::NoImage)?;
        let scale = match self.scale.clone() {
            Some(scale) => scale,
            None => {
                let samples = if self.scale_params.needs_samples() {
                    collect_scale_samples(
                        image.source.as_ref(),
                        image.grid.image_width(),
                        image.grid.image_height(),
                        self.config.stats_window,
                        self.config.max_stat_windows,
                    )?
                } else {
                    Vec::new()
                };
                let prepared = Arc::new(prepare_scale(&samples, &self.scale_params)?);
                let (vmin, vmax) = prepared.limits();
                info!(
                    algorithm = self.scale_params.algorithm.name(),
                    vmin,
                    vmax,
                    "Resolved image scale"
                );
                self.scale = Some(Arc::clone(&prepared));
                prepared
            }
        };

        Ok(LoadContext {
            source: Arc::clone(&image.source),
            scale,
            lut: self.colormap.lut().clone(),
            grid_id: image.grid.grid_id(),
            generation: self.generation,
        })
    }

    /// Load synchronously or queue a background load. Returns whether any work
    /// was started.
    fn request_tile(&mut self, coord: TileCoord) -> Result<bool> {
        if self.loader.is_none() {
            self.load_tile(coord)?;
            return Ok(true);
        }
        let region = self
            .grid()
            .and_then(|g| g.get(coord))
            .map(|t| t.region())
            .ok_or(RenderError::NoImage)?;
        let ctx = self.load_context()?;
        Ok(self
            .loader
            .as_mut()
            .is_some_and(|loader| loader.submit(&ctx, coord, region)))
    }

    /// Upload finished background loads, dropping stale or unwanted ones.
    fn collect_background_loads(&mut self, viewport: &Viewport) -> Vec<TileFailure> {
        let results = match self.loader.as_mut() {
            Some(loader) => loader.drain(),
            None => return Vec::new(),
        };
        let mut failures = Vec::new();
        for result in results {
            let coord = result.coord;
            if let Err(e) = self.accept_result(result, viewport) {
                if e.is_recoverable() {
                    warn!(tile = %coord, error = %e, "Background tile load failed");
                } else {
                    warn!(tile = %coord, error = %e, "Background tile upload failed");
                }
                failures.push(TileFailure {
                    coord,
                    message: e.to_string(),
                });
            }
        }
        failures
    }

    fn accept_result(&mut self, result: TileResult, viewport: &Viewport) -> Result<()> {
        let Some(grid) = self.grid() else {
            return Ok(());
        };
        if result.grid_id != grid.grid_id() || result.generation != self.generation {
            debug!(tile = %result.coord, generation = result.generation, "Dropped stale tile load");
            return Ok(());
        }
        let wanted = grid
            .visible_span(viewport)
            .expanded(
                self.config.prefetch_margin,
                grid.num_tiles_x(),
                grid.num_tiles_y(),
            )
            .contains(result.coord);
        if !wanted {
            debug!(tile = %result.coord, "Dropped tile load no longer in view");
            return Ok(());
        }
        let image = result.outcome?;
        self.upload(result.coord, image, result.generation)
    }

    /// Create the tile's texture, or refresh it in place when it already exists.
    fn upload(&mut self, coord: TileCoord, image: TileImage, generation: u64) -> Result<()> {
        let mipmap = self.config.mipmaps;
        let Some(state) = self.image.as_mut() else {
            return Err(RenderError::NoImage);
        };
        let Some(tile) = state.grid.get_mut(coord) else {
            return Ok(());
        };
        let pixels = TexturePixels::rgba8(image.width, image.height, &image.rgba);

        let refreshed = tile.is_loaded()
            && self.cache.has_texture(tile.texture_key())
            && self.cache.update_texture(tile.texture_key(), pixels, (0, 0)).is_ok();
        if !refreshed {
            self.cache.create_texture(tile.texture_key(), pixels, mipmap)?;
        }
        tile.mark_loaded(generation);
        debug!(
            tile = %coord,
            bytes = image.byte_size(),
            refreshed,
            "Loaded tile"
        );

        self.sync_evictions();
        Ok(())
    }

    /// Flip `loaded` off for tiles whose textures the cache evicted.
    fn sync_evictions(&mut self) {
        let evicted: HashSet<String> = self.cache.take_evicted().into_iter().collect();
        if evicted.is_empty() {
            return;
        }
        let Some(state) = self.image.as_mut() else {
            return;
        };
        for tile in state.grid.iter_tiles_mut() {
            if evicted.contains(tile.texture_key()) {
                tile.mark_unloaded();
            }
        }
    }

    fn draw_tile(&mut self, coord: TileCoord, viewport: &Viewport) -> Result<Option<TileDraw>> {
        let Some(state) = self.image.as_mut() else {
            return Ok(None);
        };
        let Some(tile) = state.grid.get_mut(coord) else {
            return Ok(None);
        };
        if !tile.is_loaded() {
            return Ok(None);
        }
        let Some(texture) = self.cache.get_texture(tile.texture_key())? else {
            tile.mark_unloaded();
            return Ok(None);
        };

        let region = tile.region();
        let zoom = if viewport.zoom > 0.0 { viewport.zoom } else { 1.0 };
        let (screen_x, screen_y) = (
            (region.x as f64 - viewport.x) * zoom,
            (region.y as f64 - viewport.y) * zoom,
        );
        Ok(Some(TileDraw {
            coord,
            texture,
            region,
            screen_x,
            screen_y,
            screen_width: region.width as f64 * zoom,
            screen_height: region.height as f64 * zoom,
        }))
    }

    // ------------------------------------------------------------------------
    // Cache telemetry
    // ------------------------------------------------------------------------

    pub fn current_cache_size(&self) -> usize {
        self.cache.current_cache_size()
    }

    pub fn max_cache_size(&self) -> usize {
        self.cache.max_cache_size()
    }

    /// Change the texture budget, evicting down to it immediately.
    pub fn set_max_cache_size(&mut self, max_bytes: usize) {
        self.cache.set_max_cache_size(max_bytes);
        self.config.cache_max_bytes = max_bytes;
        self.sync_evictions();
    }

    pub fn cache_stats(&self) -> TextureCacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &TextureCache<B> {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        self.cache.backend()
    }

    /// Background loads in flight.
    pub fn pending_loads(&self) -> usize {
        self.loader.as_ref().map_or(0, |l| l.pending())
    }
}

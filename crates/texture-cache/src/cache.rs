//! LRU texture cache with a byte budget.
//!
//! ## Memory-Based Eviction
//!
//! Entries are charged `width · height · channels · bytes_per_channel` bytes.
//! Before a new texture is inserted, least-recently-used entries are destroyed
//! until it fits. Lowering the budget evicts immediately.
//!
//! Recency is tracked by an [`lru::LruCache`] (hash map plus intrusive linked
//! list), so touch, insert and evict are all O(1).
//!
//! ## Metrics
//!
//! Hits, misses and evictions are counted locally (see [`TextureCacheStats`]) and
//! mirrored to the `metrics` facade as `texture_cache_*`.

use lru::LruCache;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{GpuBackend, TextureId};
use crate::error::{Result, TextureError};
use crate::format::{TextureFormat, TexturePixels};

/// Metadata of a cached texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureEntry {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub size_bytes: usize,
    pub mipmap: bool,
}

/// Snapshot of cache telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TextureCacheStats {
    pub current_bytes: usize,
    pub max_bytes: usize,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub bytes_evicted_total: u64,
}

impl TextureCacheStats {
    /// Hit percentage over all lookups, 0 when there were none.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// Fraction of the budget in use.
    pub fn utilization(&self) -> f64 {
        if self.max_bytes == 0 {
            0.0
        } else {
            self.current_bytes as f64 / self.max_bytes as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Uninitialized,
    Ready,
}

/// A capacity-bounded key → GPU texture map.
pub struct TextureCache<B: GpuBackend> {
    backend: B,
    state: ContextState,
    entries: LruCache<String, TextureEntry>,
    max_bytes: usize,
    current_bytes: usize,
    evicted: Vec<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
    bytes_evicted_total: u64,
}

impl<B: GpuBackend> TextureCache<B> {
    /// Create an uninitialized cache with a budget of `max_bytes`.
    pub fn new(backend: B, max_bytes: usize) -> Self {
        Self {
            backend,
            state: ContextState::Uninitialized,
            entries: LruCache::unbounded(),
            max_bytes,
            current_bytes: 0,
            evicted: Vec::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            bytes_evicted_total: 0,
        }
    }

    /// Bring up the GPU context. Idempotent.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state == ContextState::Ready {
            return Ok(());
        }
        self.backend.initialize()?;
        self.state = ContextState::Ready;
        info!(max_bytes = self.max_bytes, "Texture cache initialized");
        Ok(())
    }

    /// Release every texture and tear the context down.
    pub fn shutdown(&mut self) {
        if self.state == ContextState::Uninitialized {
            return;
        }
        let released = self.clear();
        self.backend.shutdown();
        self.state = ContextState::Uninitialized;
        info!(released, "Texture cache shut down");
    }

    pub fn is_ready(&self) -> bool {
        self.state == ContextState::Ready
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            ContextState::Ready => Ok(()),
            ContextState::Uninitialized => Err(TextureError::ContextNotReady),
        }
    }

    /// Create (or replace) the texture stored under `key`.
    ///
    /// An existing texture for `key` is destroyed first, then least-recently-used
    /// entries are evicted until the new one fits. A texture larger than the
    /// whole budget is rejected without touching the cache.
    pub fn create_texture(
        &mut self,
        key: &str,
        pixels: TexturePixels<'_>,
        mipmap: bool,
    ) -> Result<TextureId> {
        self.ensure_ready()?;
        pixels.validate()?;

        let size = pixels.byte_size();
        if size > self.max_bytes {
            return Err(TextureError::ExceedsBudget {
                key: key.to_string(),
                size,
                max_bytes: self.max_bytes,
            });
        }

        if let Some(old) = self.entries.pop(key) {
            self.backend.destroy(old.id);
            self.current_bytes -= old.size_bytes;
            debug!(key, "Replaced existing texture");
        }

        let evicted = self.evict_until(self.max_bytes.saturating_sub(size));
        if evicted > 0 {
            info!(
                key,
                evicted,
                current_bytes = self.current_bytes,
                "Evicted textures to make room"
            );
        }

        let id = self
            .backend
            .create(pixels.width, pixels.height, pixels.format, pixels.data)?;
        if mipmap {
            if let Err(e) = self.backend.generate_mipmaps(id) {
                self.backend.destroy(id);
                return Err(e.into());
            }
        }

        self.entries.put(
            key.to_string(),
            TextureEntry {
                id,
                width: pixels.width,
                height: pixels.height,
                format: pixels.format,
                size_bytes: size,
                mipmap,
            },
        );
        self.current_bytes += size;
        self.record_size();
        debug!(key, %id, bytes = size, "Created texture");
        Ok(id)
    }

    /// Overwrite part of an existing texture at `offset`. Counts as a touch.
    pub fn update_texture(
        &mut self,
        key: &str,
        pixels: TexturePixels<'_>,
        offset: (u32, u32),
    ) -> Result<()> {
        self.ensure_ready()?;
        pixels.validate()?;

        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| TextureError::NotFound(key.to_string()))?;

        if pixels.format != entry.format {
            return Err(TextureError::invalid(format!(
                "format {:?} does not match texture format {:?}",
                pixels.format, entry.format
            )));
        }
        let (x, y) = offset;
        let fits_x = x.checked_add(pixels.width).is_some_and(|r| r <= entry.width);
        let fits_y = y.checked_add(pixels.height).is_some_and(|b| b <= entry.height);
        if !fits_x || !fits_y {
            return Err(TextureError::invalid(format!(
                "{}x{} update at ({x}, {y}) exceeds {}x{} texture",
                pixels.width, pixels.height, entry.width, entry.height
            )));
        }

        let (id, mipmap) = (entry.id, entry.mipmap);
        self.backend
            .update_subregion(id, x, y, pixels.width, pixels.height, pixels.data)?;
        if mipmap {
            self.backend.generate_mipmaps(id)?;
        }
        Ok(())
    }

    /// Look up a texture, marking it most recently used on a hit.
    pub fn get_texture(&mut self, key: &str) -> Result<Option<TextureId>> {
        self.ensure_ready()?;
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                metrics::counter!("texture_cache_hits_total").increment(1);
                Ok(Some(entry.id))
            }
            None => {
                self.misses += 1;
                metrics::counter!("texture_cache_misses_total").increment(1);
                Ok(None)
            }
        }
    }

    /// Destroy the texture under `key`. Absent keys are a no-op.
    pub fn delete_texture(&mut self, key: &str) -> Result<()> {
        self.ensure_ready()?;
        if let Some(entry) = self.entries.pop(key) {
            self.backend.destroy(entry.id);
            self.current_bytes -= entry.size_bytes;
            self.record_size();
            debug!(key, "Deleted texture");
        }
        Ok(())
    }

    /// Whether `key` is cached, without touching it.
    pub fn has_texture(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Entry metadata, without touching it.
    pub fn texture_info(&self, key: &str) -> Option<&TextureEntry> {
        self.entries.peek(key)
    }

    /// Destroy every texture. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        while let Some((_, entry)) = self.entries.pop_lru() {
            self.backend.destroy(entry.id);
        }
        self.current_bytes = 0;
        self.record_size();
        count
    }

    /// Change the budget, evicting down to it immediately.
    pub fn set_max_cache_size(&mut self, max_bytes: usize) {
        let previous = self.max_bytes;
        self.max_bytes = max_bytes;
        let evicted = self.evict_until(max_bytes);
        info!(
            previous,
            max_bytes,
            evicted,
            current_bytes = self.current_bytes,
            "Texture cache limit changed"
        );
    }

    pub fn current_cache_size(&self) -> usize {
        self.current_bytes
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys evicted by the budget since the last call.
    pub fn take_evicted(&mut self) -> Vec<String> {
        std::mem::take(&mut self.evicted)
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.entries.iter().rev().map(|(k, _)| k.clone()).collect()
    }

    pub fn stats(&self) -> TextureCacheStats {
        TextureCacheStats {
            current_bytes: self.current_bytes,
            max_bytes: self.max_bytes,
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            bytes_evicted_total: self.bytes_evicted_total,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Pop least-recently-used entries while usage exceeds `target` bytes.
    fn evict_until(&mut self, target: usize) -> usize {
        let mut evicted = 0;
        while self.current_bytes > target {
            let Some((key, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.backend.destroy(entry.id);
            self.current_bytes -= entry.size_bytes;
            self.evictions += 1;
            self.bytes_evicted_total += entry.size_bytes as u64;
            debug!(key = %key, bytes = entry.size_bytes, "Evicted texture");
            self.evicted.push(key);
            evicted += 1;
        }
        if evicted > 0 {
            metrics::counter!("texture_cache_evictions_total").increment(evicted as u64);
            self.record_size();
        }
        evicted
    }

    fn record_size(&self) {
        metrics::gauge!("texture_cache_size_bytes").set(self.current_bytes as f64);
        metrics::gauge!("texture_cache_entries").set(self.entries.len() as f64);
    }
}

impl<B: GpuBackend> Drop for TextureCache<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareGpu;

    /// A 150-pixel RGBA texture is 600 bytes.
    fn pixels_600() -> Vec<u8> {
        vec![7u8; 600]
    }

    fn ready_cache(max_bytes: usize) -> TextureCache<SoftwareGpu> {
        let mut cache = TextureCache::new(SoftwareGpu::new(), max_bytes);
        cache.initialize().unwrap();
        cache
    }

    #[test]
    fn test_operations_before_initialize_fail() {
        let mut cache = TextureCache::new(SoftwareGpu::new(), 1000);
        let data = pixels_600();
        assert_eq!(
            cache.create_texture("a", TexturePixels::rgba8(150, 1, &data), false),
            Err(TextureError::ContextNotReady)
        );
        assert_eq!(cache.get_texture("a"), Err(TextureError::ContextNotReady));
        assert_eq!(cache.delete_texture("a"), Err(TextureError::ContextNotReady));
        assert_eq!(
            cache.update_texture("a", TexturePixels::rgba8(150, 1, &data), (0, 0)),
            Err(TextureError::ContextNotReady)
        );
    }

    #[test]
    fn test_second_600_byte_tile_evicts_first() {
        let mut cache = ready_cache(1000);
        let data = pixels_600();
        cache
            .create_texture("A", TexturePixels::rgba8(150, 1, &data), false)
            .unwrap();
        cache
            .create_texture("B", TexturePixels::rgba8(150, 1, &data), false)
            .unwrap();

        assert!(!cache.has_texture("A"));
        assert!(cache.has_texture("B"));
        assert_eq!(cache.current_cache_size(), 600);
        assert_eq!(cache.take_evicted(), vec!["A".to_string()]);
        assert!(cache.take_evicted().is_empty());
        assert_eq!(cache.backend().live_textures(), 1);
    }

    #[test]
    fn test_touch_order_decides_eviction() {
        let mut cache = ready_cache(1000);
        let data = vec![0u8; 400];
        cache.create_texture("A", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        cache.create_texture("B", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        // Touch A so B becomes the oldest.
        cache.get_texture("A").unwrap();
        cache.create_texture("C", TexturePixels::rgba8(10, 10, &data), false).unwrap();

        assert!(cache.has_texture("A"));
        assert!(!cache.has_texture("B"));
        assert_eq!(cache.keys_by_recency(), vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_replacing_key_frees_old_texture() {
        let mut cache = ready_cache(1000);
        let data = pixels_600();
        let first = cache.create_texture("A", TexturePixels::rgba8(150, 1, &data), false).unwrap();
        let second = cache.create_texture("A", TexturePixels::rgba8(150, 1, &data), false).unwrap();
        assert_ne!(first, second);
        assert_eq!(cache.current_cache_size(), 600);
        assert_eq!(cache.len(), 1);
        // Replacement is not an eviction.
        assert!(cache.take_evicted().is_empty());
        assert!(cache.backend().texture(first).is_none());
    }

    #[test]
    fn test_oversized_texture_rejected_without_eviction() {
        let mut cache = ready_cache(1000);
        let small = vec![0u8; 400];
        cache.create_texture("A", TexturePixels::rgba8(10, 10, &small), false).unwrap();
        let big = vec![0u8; 1200];
        let err = cache
            .create_texture("B", TexturePixels::rgba8(300, 1, &big), false)
            .unwrap_err();
        assert!(matches!(err, TextureError::ExceedsBudget { size: 1200, .. }));
        assert!(cache.has_texture("A"));
        assert_eq!(cache.current_cache_size(), 400);
    }

    #[test]
    fn test_update_texture() {
        let mut cache = ready_cache(1000);
        let data = vec![0u8; 16];
        let id = cache.create_texture("A", TexturePixels::rgba8(2, 2, &data), false).unwrap();
        cache
            .update_texture("A", TexturePixels::rgba8(1, 1, &[9, 9, 9, 9]), (1, 1))
            .unwrap();
        let tex = cache.backend().texture(id).unwrap();
        assert_eq!(tex.pixel(1, 1), Some(&[9u8, 9, 9, 9][..]));

        assert_eq!(
            cache.update_texture("missing", TexturePixels::rgba8(1, 1, &[0; 4]), (0, 0)),
            Err(TextureError::NotFound("missing".to_string()))
        );
        assert!(matches!(
            cache.update_texture("A", TexturePixels::rgba8(2, 2, &data), (1, 0)),
            Err(TextureError::InvalidPixelData(_))
        ));
        let floats = [0.0f32; 1];
        assert!(matches!(
            cache.update_texture(
                "A",
                TexturePixels::from_f32(1, 1, TextureFormat::R32F, &floats),
                (0, 0)
            ),
            Err(TextureError::InvalidPixelData(_))
        ));
    }

    #[test]
    fn test_update_touches_entry() {
        let mut cache = ready_cache(1000);
        let data = vec![0u8; 400];
        cache.create_texture("A", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        cache.create_texture("B", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        cache
            .update_texture("A", TexturePixels::rgba8(1, 1, &[1, 2, 3, 4]), (0, 0))
            .unwrap();
        assert_eq!(cache.keys_by_recency(), vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut cache = ready_cache(1000);
        let data = vec![0u8; 400];
        cache.create_texture("A", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        cache.create_texture("B", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        cache.delete_texture("A").unwrap();
        assert_eq!(cache.current_cache_size(), 400);
        cache.delete_texture("A").unwrap();
        assert_eq!(cache.current_cache_size(), 400);
        assert!(cache.take_evicted().is_empty());
    }

    #[test]
    fn test_lowering_limit_evicts_immediately() {
        let mut cache = ready_cache(2000);
        let data = vec![0u8; 400];
        for key in ["A", "B", "C", "D"] {
            cache.create_texture(key, TexturePixels::rgba8(10, 10, &data), false).unwrap();
        }
        cache.set_max_cache_size(900);
        assert_eq!(cache.current_cache_size(), 800);
        assert_eq!(cache.keys_by_recency(), vec!["C".to_string(), "D".to_string()]);
        assert_eq!(cache.take_evicted(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut cache = ready_cache(2000);
        let data = vec![0u8; 400];
        cache.create_texture("A", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        cache.shutdown();
        assert!(!cache.is_ready());
        assert_eq!(cache.current_cache_size(), 0);
        assert_eq!(cache.backend().live_textures(), 0);
        assert_eq!(cache.get_texture("A"), Err(TextureError::ContextNotReady));

        cache.initialize().unwrap();
        assert_eq!(cache.get_texture("A"), Ok(None));
    }

    #[test]
    fn test_stats() {
        let mut cache = ready_cache(1000);
        let data = vec![0u8; 400];
        cache.create_texture("A", TexturePixels::rgba8(10, 10, &data), false).unwrap();
        cache.get_texture("A").unwrap();
        cache.get_texture("nope").unwrap();
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_rate(), 50.0);
        assert!((stats.utilization() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_mipmap_flag() {
        let mut cache = ready_cache(1000);
        let data = vec![0u8; 64];
        let id = cache.create_texture("A", TexturePixels::rgba8(4, 4, &data), true).unwrap();
        assert!(cache.texture_info("A").unwrap().mipmap);
        assert_eq!(cache.backend().texture(id).unwrap().mip_levels, 3);
    }
}

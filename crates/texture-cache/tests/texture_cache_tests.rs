//! Integration tests for the texture cache.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use texture_cache::{
    GpuBackend, GpuError, SoftwareGpu, TextureCache, TextureError, TextureFormat, TextureId,
    TexturePixels,
};

fn ready(max_bytes: usize) -> TextureCache<SoftwareGpu> {
    let mut cache = TextureCache::new(SoftwareGpu::new(), max_bytes);
    cache.initialize().unwrap();
    cache
}

// ============================================================================
// Budget invariants
// ============================================================================

#[test]
fn test_usage_never_exceeds_budget_under_random_load() {
    let mut rng = StdRng::seed_from_u64(42);
    let max = 64 * 1024;
    let mut cache = ready(max);

    for i in 0..500 {
        let side = rng.gen_range(1..=64u32);
        let data = vec![0u8; TextureFormat::Rgba8.byte_size(side, side)];
        let key = format!("tile_{}", rng.gen_range(0..40));
        match cache.create_texture(&key, TexturePixels::rgba8(side, side, &data), false) {
            Ok(_) => assert!(cache.has_texture(&key)),
            Err(TextureError::ExceedsBudget { size, .. }) => assert!(size > max),
            Err(e) => panic!("unexpected error at step {i}: {e}"),
        }
        if rng.gen_bool(0.3) {
            let _ = cache.get_texture(&format!("tile_{}", rng.gen_range(0..40))).unwrap();
        }
        assert!(cache.current_cache_size() <= max);

        let tracked: usize = cache
            .keys_by_recency()
            .iter()
            .map(|k| cache.texture_info(k).unwrap().size_bytes)
            .sum();
        assert_eq!(tracked, cache.current_cache_size());
        assert_eq!(cache.backend().allocated_bytes(), cache.current_cache_size());
    }
}

#[test]
fn test_evicted_keys_are_reported_once() {
    let mut cache = ready(4 * 400);
    let data = vec![0u8; 400];
    for i in 0..10 {
        cache
            .create_texture(&format!("k{i}"), TexturePixels::rgba8(10, 10, &data), false)
            .unwrap();
    }
    let evicted = cache.take_evicted();
    assert_eq!(evicted, (0..6).map(|i| format!("k{i}")).collect::<Vec<_>>());
    assert_eq!(cache.stats().evictions, 6);
    assert_eq!(cache.stats().bytes_evicted_total, 2400);
    assert!(cache.take_evicted().is_empty());
}

#[test]
fn test_float_textures_are_charged_four_bytes_per_channel() {
    let mut cache = ready(10_000);
    let data = vec![0.5f32; 25 * 25];
    cache
        .create_texture(
            "raw",
            TexturePixels::from_f32(25, 25, TextureFormat::R32F, &data),
            false,
        )
        .unwrap();
    assert_eq!(cache.current_cache_size(), 25 * 25 * 4);
    assert_eq!(cache.texture_info("raw").unwrap().format, TextureFormat::R32F);
}

#[test]
fn test_raising_budget_keeps_entries() {
    let mut cache = ready(1000);
    let data = vec![0u8; 400];
    cache.create_texture("a", TexturePixels::rgba8(10, 10, &data), false).unwrap();
    cache.set_max_cache_size(5000);
    assert!(cache.has_texture("a"));
    assert_eq!(cache.max_cache_size(), 5000);
    assert!(cache.take_evicted().is_empty());
}

#[test]
fn test_zero_budget_rejects_everything() {
    let mut cache = ready(0);
    let data = vec![0u8; 4];
    assert!(matches!(
        cache.create_texture("a", TexturePixels::rgba8(1, 1, &data), false),
        Err(TextureError::ExceedsBudget { .. })
    ));
    assert!(cache.is_empty());
}

// ============================================================================
// Backend failures
// ============================================================================

#[test]
fn test_backend_out_of_memory_is_surfaced() {
    let mut cache = TextureCache::new(SoftwareGpu::with_texture_limit(2), 1 << 20);
    cache.initialize().unwrap();
    let data = vec![0u8; 4];
    cache.create_texture("a", TexturePixels::rgba8(1, 1, &data), false).unwrap();
    cache.create_texture("b", TexturePixels::rgba8(1, 1, &data), false).unwrap();
    let err = cache
        .create_texture("c", TexturePixels::rgba8(1, 1, &data), false)
        .unwrap_err();
    assert!(matches!(err, TextureError::Gpu(GpuError::OutOfMemory(_))));
    assert!(!cache.has_texture("c"));
    assert_eq!(cache.current_cache_size(), 8);
}

#[test]
fn test_invalid_payload_rejected_before_backend() {
    let mut cache = ready(1000);
    let short = vec![0u8; 3];
    assert!(matches!(
        cache.create_texture("a", TexturePixels::rgba8(1, 1, &short), false),
        Err(TextureError::InvalidPixelData(_))
    ));
    assert_eq!(cache.backend().create_count(), 0);
}

/// Backend whose context fails to come up.
struct LostContext;

impl GpuBackend for LostContext {
    fn create(
        &mut self,
        _width: u32,
        _height: u32,
        _format: TextureFormat,
        _data: &[u8],
    ) -> Result<TextureId, GpuError> {
        Err(GpuError::ContextLost)
    }

    fn update_subregion(
        &mut self,
        _id: TextureId,
        _x: u32,
        _y: u32,
        _width: u32,
        _height: u32,
        _data: &[u8],
    ) -> Result<(), GpuError> {
        Err(GpuError::ContextLost)
    }

    fn destroy(&mut self, _id: TextureId) {}

    fn initialize(&mut self) -> Result<(), GpuError> {
        Err(GpuError::ContextLost)
    }
}

#[test]
fn test_failed_initialize_leaves_cache_unready() {
    let mut cache = TextureCache::new(LostContext, 1000);
    assert_eq!(
        cache.initialize(),
        Err(TextureError::Gpu(GpuError::ContextLost))
    );
    assert!(!cache.is_ready());
    assert_eq!(cache.get_texture("a"), Err(TextureError::ContextNotReady));
}

#[test]
fn test_boxed_backend() {
    let backend: Box<dyn GpuBackend> = Box::new(SoftwareGpu::new());
    let mut cache = TextureCache::new(backend, 1000);
    cache.initialize().unwrap();
    let data = vec![0u8; 16];
    let id = cache.create_texture("a", TexturePixels::rgba8(2, 2, &data), false).unwrap();
    assert_eq!(cache.get_texture("a").unwrap(), Some(id));
}

// ============================================================================
// Telemetry
// ============================================================================

#[test]
fn test_stats_serialize() {
    let mut cache = ready(1000);
    let data = vec![0u8; 16];
    cache.create_texture("a", TexturePixels::rgba8(2, 2, &data), false).unwrap();
    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["current_bytes"], 16);
    assert_eq!(json["max_bytes"], 1000);
    assert_eq!(json["entries"], 1);
}

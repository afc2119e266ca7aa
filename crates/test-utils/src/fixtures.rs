//! `PixelSource` fixtures.
//!
//! These wrap an in-memory raster and add the behaviours renderer tests need to
//! observe: counting fetches, failing on demand, and slowing fetches down.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tile_common::{FetchError, InMemorySource, PixelBuffer, PixelRegion, PixelSource};

/// An in-memory source over `data`, which must hold `width * height` samples.
pub fn memory_source(width: u32, height: u32, data: Vec<f32>) -> InMemorySource {
    let buffer = match PixelBuffer::new(width, height, data) {
        Ok(buffer) => buffer,
        Err(e) => panic!("invalid fixture raster: {e}"),
    };
    InMemorySource::new(buffer)
}

/// An in-memory source where every pixel holds `row * width + col`.
pub fn numbered_source(width: u32, height: u32) -> InMemorySource {
    memory_source(
        width,
        height,
        crate::create_numbered_image(width as usize, height as usize),
    )
}

/// Records every fetched region.
pub struct CountingSource<S> {
    inner: S,
    calls: AtomicUsize,
    regions: Mutex<Vec<PixelRegion>>,
}

impl<S: PixelSource> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            regions: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn regions(&self) -> Vec<PixelRegion> {
        self.regions.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.regions.lock().unwrap().clear();
    }
}

impl<S: PixelSource> PixelSource for CountingSource<S> {
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.regions.lock().unwrap().push(region);
        self.inner.fetch(region)
    }
}

/// Fails fetches whose region starts at one of the configured origins, or every
/// fetch while `fail_all` is set.
pub struct FailingSource<S> {
    inner: S,
    failing_origins: Mutex<HashSet<(u32, u32)>>,
    fail_all: AtomicBool,
}

impl<S: PixelSource> FailingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_origins: Mutex::new(HashSet::new()),
            fail_all: AtomicBool::new(false),
        }
    }

    /// Fail fetches of regions whose top-left corner is `(x, y)`.
    pub fn fail_at(&self, x: u32, y: u32) {
        self.failing_origins.lock().unwrap().insert((x, y));
    }

    pub fn heal(&self) {
        self.failing_origins.lock().unwrap().clear();
        self.fail_all.store(false, Ordering::SeqCst);
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }
}

impl<S: PixelSource> PixelSource for FailingSource<S> {
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError> {
        if self.fail_all.load(Ordering::SeqCst)
            || self
                .failing_origins
                .lock()
                .unwrap()
                .contains(&(region.x, region.y))
        {
            return Err(FetchError::new(region, "injected failure"));
        }
        self.inner.fetch(region)
    }
}

/// Returns a buffer of the wrong length for every fetch.
pub struct ShortSource;

impl PixelSource for ShortSource {
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError> {
        Ok(vec![0.0; region.len().saturating_sub(1)])
    }
}

/// Sleeps before delegating, to keep background loads in flight.
pub struct SlowSource<S> {
    inner: S,
    delay: Duration,
}

impl<S: PixelSource> SlowSource<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<S: PixelSource> PixelSource for SlowSource<S> {
    fn fetch(&self, region: PixelRegion) -> Result<Vec<f32>, FetchError> {
        std::thread::sleep(self.delay);
        self.inner.fetch(region)
    }
}

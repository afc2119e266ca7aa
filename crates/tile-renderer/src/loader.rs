//! Background tile loading.
//!
//! Workers in a dedicated `rayon` pool fetch, scale and colorize tiles. Finished
//! tiles come back through a bounded channel and are uploaded by the render
//! thread, which owns the GPU context. A full channel blocks workers until the
//! render thread drains it.
//!
//! Every job carries the grid id and render generation it was started for; the
//! renderer drops results whose grid, generation or visibility no longer match.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use colormap::Lut;
use rayon::{ThreadPool, ThreadPoolBuilder};
use scaling::PreparedScale;
use tile_common::{PixelRegion, PixelSource, TileCoord};
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::pixels::{fetch_tile_pixels, TileImage};

/// Everything a worker needs to produce tile pixels, frozen at submit time.
#[derive(Clone)]
pub struct LoadContext {
    pub source: Arc<dyn PixelSource>,
    pub scale: Arc<PreparedScale>,
    pub lut: Lut,
    pub grid_id: u64,
    pub generation: u64,
}

/// A finished background load.
#[derive(Debug)]
pub struct TileResult {
    pub coord: TileCoord,
    pub grid_id: u64,
    pub generation: u64,
    pub outcome: Result<TileImage>,
}

pub struct TileLoader {
    pool: ThreadPool,
    sender: SyncSender<TileResult>,
    receiver: Receiver<TileResult>,
    /// Grid id and generation of the newest job submitted per tile.
    in_flight: HashMap<TileCoord, (u64, u64)>,
}

impl TileLoader {
    pub fn new(threads: usize, queue_depth: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("tile-loader-{i}"))
            .build()
            .map_err(|e| RenderError::Config(format!("tile loader pool: {e}")))?;
        let (sender, receiver) = mpsc::sync_channel(queue_depth.max(1));
        Ok(Self {
            pool,
            sender,
            receiver,
            in_flight: HashMap::new(),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue a load unless one for the same tile and generation is already running.
    pub fn submit(&mut self, ctx: &LoadContext, coord: TileCoord, region: PixelRegion) -> bool {
        let job = (ctx.grid_id, ctx.generation);
        if self.in_flight.get(&coord) == Some(&job) {
            return false;
        }
        self.in_flight.insert(coord, job);

        let ctx = ctx.clone();
        let sender = self.sender.clone();
        self.pool.spawn(move || {
            let outcome = fetch_tile_pixels(ctx.source.as_ref(), region, &ctx.scale, &ctx.lut);
            // The receiver only disappears when the loader is dropped.
            let _ = sender.send(TileResult {
                coord,
                grid_id: ctx.grid_id,
                generation: ctx.generation,
                outcome,
            });
        });
        debug!(tile = %coord, generation = ctx.generation, "Queued tile load");
        true
    }

    pub fn is_in_flight(&self, coord: TileCoord) -> bool {
        self.in_flight.contains_key(&coord)
    }

    /// Loads submitted and not yet drained.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Take every finished result without blocking.
    pub fn drain(&mut self) -> Vec<TileResult> {
        let mut results = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(result) => {
                    self.settle(&result);
                    results.push(result);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        results
    }

    /// Block for the next finished result, up to `timeout`.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<TileResult> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => {
                self.settle(&result);
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Forget in-flight bookkeeping, e.g. when the grid is replaced. Jobs still
    /// running complete and are discarded by grid id.
    pub fn reset(&mut self) {
        self.in_flight.clear();
    }

    fn settle(&mut self, result: &TileResult) {
        if self.in_flight.get(&result.coord) == Some(&(result.grid_id, result.generation)) {
            self.in_flight.remove(&result.coord);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colormap::ColormapEngine;
    use scaling::{prepare_scale, ScaleAlgorithm, ScaleParameters};
    use tile_common::{InMemorySource, PixelBuffer};

    fn context(generation: u64) -> LoadContext {
        context_for_grid(1, generation)
    }

    fn context_for_grid(grid_id: u64, generation: u64) -> LoadContext {
        let buffer = PixelBuffer::new(4, 4, (0..16).map(|i| i as f32).collect()).unwrap();
        let params = ScaleParameters::new(ScaleAlgorithm::Linear).with_limits(0.0, 15.0);
        LoadContext {
            source: Arc::new(InMemorySource::new(buffer)),
            scale: Arc::new(prepare_scale(&[], &params).unwrap()),
            lut: ColormapEngine::default().lut().clone(),
            grid_id,
            generation,
        }
    }

    #[test]
    fn test_submit_and_receive() {
        let mut loader = TileLoader::new(2, 4).unwrap();
        let coord = TileCoord::new(0, 0);
        assert!(loader.submit(&context(1), coord, PixelRegion::new(0, 0, 2, 2)));
        assert!(loader.is_in_flight(coord));

        let result = loader.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(result.coord, coord);
        assert_eq!(result.generation, 1);
        assert_eq!(result.outcome.unwrap().byte_size(), 16);
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn test_duplicate_submit_ignored() {
        let mut loader = TileLoader::new(1, 4).unwrap();
        let coord = TileCoord::new(1, 0);
        let region = PixelRegion::new(2, 0, 2, 2);
        assert!(loader.submit(&context(1), coord, region));
        assert!(!loader.submit(&context(1), coord, region));
        // A newer generation supersedes the running job.
        assert!(loader.submit(&context(2), coord, region));

        let mut generations = Vec::new();
        while let Some(result) = loader.recv_timeout(Duration::from_secs(10)) {
            generations.push(result.generation);
            if generations.len() == 2 {
                break;
            }
        }
        generations.sort();
        assert_eq!(generations, vec![1, 2]);
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn test_fetch_errors_are_returned() {
        let mut loader = TileLoader::new(1, 1).unwrap();
        loader.submit(&context(1), TileCoord::new(5, 5), PixelRegion::new(3, 3, 4, 4));
        let result = loader.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(result.outcome, Err(RenderError::Fetch(_))));
    }

    #[test]
    fn test_old_grid_result_keeps_new_grid_job_in_flight() {
        let mut loader = TileLoader::new(1, 4).unwrap();
        let coord = TileCoord::new(0, 0);
        let region = PixelRegion::new(0, 0, 2, 2);
        loader.submit(&context_for_grid(1, 1), coord, region);
        loader.reset();
        assert!(loader.submit(&context_for_grid(2, 1), coord, region));

        // A late result from the replaced grid, same tile and generation.
        loader.settle(&TileResult {
            coord,
            grid_id: 1,
            generation: 1,
            outcome: Err(RenderError::NoImage),
        });
        assert!(loader.is_in_flight(coord));
        assert!(!loader.submit(&context_for_grid(2, 1), coord, region));
    }
}

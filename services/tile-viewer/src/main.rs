//! Headless tile viewer.
//!
//! Drives the tiled renderer over a synthetic sky or a raw `f32` image, pans the
//! viewport across a number of frames, writes the last composited frame as a
//! PNG and prints cache telemetry as JSON.

mod source;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use scaling::{ScaleAlgorithm, ScaleParameters};
use serde::Serialize;
use texture_cache::{SoftwareGpu, TextureCacheStats};
use tile_common::{PixelSource, Viewport};
use tile_renderer::{FrameCompositor, RendererConfig, TileRenderer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use source::{load_raw_f32, SyntheticSky};

#[derive(Parser, Debug)]
#[command(name = "tile-viewer")]
#[command(about = "Render and pan across a large image with the tiled renderer")]
struct Args {
    /// Image width in pixels
    #[arg(long, env = "IMAGE_WIDTH", default_value = "16384")]
    width: u32,

    /// Image height in pixels
    #[arg(long, env = "IMAGE_HEIGHT", default_value = "16384")]
    height: u32,

    /// Raw little-endian f32 image file (default: synthetic star field)
    #[arg(short, long, env = "IMAGE_FILE")]
    input: Option<PathBuf>,

    /// Stars in the synthetic image
    #[arg(long, default_value = "20000")]
    stars: usize,

    /// Seed for the synthetic image
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Renderer configuration file (default: environment)
    #[arg(short, long, env = "RENDERER_CONFIG")]
    config: Option<PathBuf>,

    /// Screen width in pixels
    #[arg(long, default_value = "1280")]
    screen_width: u32,

    /// Screen height in pixels
    #[arg(long, default_value = "800")]
    screen_height: u32,

    /// Screen pixels per image pixel
    #[arg(long, default_value = "1.0")]
    zoom: f64,

    /// Initial centre x (default: image centre)
    #[arg(long)]
    center_x: Option<f64>,

    /// Initial centre y (default: image centre)
    #[arg(long)]
    center_y: Option<f64>,

    /// Colormap name
    #[arg(long, env = "COLORMAP", default_value = "grey")]
    colormap: String,

    /// Reverse the colormap
    #[arg(long)]
    inverted: bool,

    /// Scale algorithm (linear, log, sqrt, power, sinh, asinh, histequ, zscale)
    #[arg(long, env = "SCALE", default_value = "asinh")]
    scale: String,

    /// Frames to render while panning
    #[arg(long, default_value = "8")]
    frames: u32,

    /// Image pixels to pan right per frame
    #[arg(long, default_value = "256")]
    pan_x: f64,

    /// Image pixels to pan down per frame
    #[arg(long, default_value = "0")]
    pan_y: f64,

    /// How long to wait for background loads each frame, in milliseconds
    #[arg(long, default_value = "5000")]
    load_timeout_ms: u64,

    /// Where to write the last frame
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: text or json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    image_width: u32,
    image_height: u32,
    tile_size: u32,
    tiles: usize,
    frames: u32,
    tiles_loaded: usize,
    failures: usize,
    elapsed_ms: u128,
    cache: TextureCacheStats,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args)?;

    let config = match &args.config {
        Some(path) => RendererConfig::from_file(path)
            .with_context(|| format!("loading renderer config {}", path.display()))?,
        None => RendererConfig::from_env(),
    };
    info!(
        tile_size = config.tile_size,
        cache_mb = config.cache_max_mb(),
        loader_threads = config.loader_threads,
        "Loaded renderer configuration"
    );

    let source: Arc<dyn PixelSource> = match &args.input {
        Some(path) => {
            info!(file = %path.display(), "Loading raw image");
            Arc::new(load_raw_f32(path, args.width, args.height)?)
        }
        None => {
            let sky = SyntheticSky::new(args.width, args.height, args.stars, args.seed);
            info!(stars = sky.star_count(), seed = args.seed, "Generated synthetic sky");
            Arc::new(sky)
        }
    };

    let algorithm = ScaleAlgorithm::from_name(&args.scale)
        .with_context(|| format!("unknown scale '{}'", args.scale))?;

    let mut renderer = TileRenderer::new(SoftwareGpu::new(), config)?;
    renderer.initialize()?;
    renderer.set_image_shared(args.width, args.height, source)?;
    renderer.set_scale(ScaleParameters::new(algorithm))?;
    if !renderer.set_colormap(&args.colormap) {
        warn!(colormap = %args.colormap, "Unknown colormap, using grey");
    }
    renderer.set_inverted(args.inverted);

    let (cx, cy) = (
        args.center_x.unwrap_or(args.width as f64 / 2.0),
        args.center_y.unwrap_or(args.height as f64 / 2.0),
    );
    let mut viewport = Viewport::centered(cx, cy, args.screen_width, args.screen_height, args.zoom);
    let timeout = Duration::from_millis(args.load_timeout_ms);
    let cleanup_distance = renderer.config().cleanup_distance;
    let compositor = FrameCompositor::default();

    let start = Instant::now();
    let mut failures = 0;
    let mut last = None;
    for frame_index in 0..args.frames.max(1) {
        let frame_start = Instant::now();
        let mut frame = renderer.render(&viewport)?;
        if !frame.is_complete() {
            renderer.finish_pending_loads(&viewport, timeout);
            frame = renderer.render(&viewport)?;
        }
        renderer.prefetch(&viewport)?;
        failures += frame.failures.len();
        for failure in &frame.failures {
            warn!(tile = %failure.coord, error = %failure.message, "Tile failed");
        }

        let unloaded = renderer.cleanup_distant_tiles(&viewport, cleanup_distance)?;
        info!(
            frame = frame_index,
            x = viewport.x,
            y = viewport.y,
            draws = frame.draws.len(),
            pending = frame.pending,
            unloaded,
            cache_bytes = renderer.current_cache_size(),
            elapsed_ms = frame_start.elapsed().as_millis() as u64,
            "Rendered frame"
        );

        last = Some(frame);
        viewport = viewport.panned(args.pan_x, args.pan_y);
    }

    if let Some(frame) = last {
        let image = compositor.composite(&frame, renderer.backend());
        let png = image
            .to_png()
            .map_err(anyhow::Error::msg)
            .context("encoding frame")?;
        std::fs::write(&args.output, png)
            .with_context(|| format!("writing {}", args.output.display()))?;
        info!(path = %args.output.display(), width = image.width, height = image.height, "Wrote frame");
    }

    let grid = renderer.grid().context("image detached during run")?;
    let summary = RunSummary {
        image_width: args.width,
        image_height: args.height,
        tile_size: grid.tile_size(),
        tiles: grid.len(),
        frames: args.frames.max(1),
        tiles_loaded: renderer.loaded_tile_count(),
        failures,
        elapsed_ms: start.elapsed().as_millis(),
        cache: renderer.cache_stats(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    renderer.shutdown();
    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match args.log_format.to_lowercase().as_str() {
        "json" => tracing::subscriber::set_global_default(builder.json().finish())?,
        _ => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

//! viewer - synchronous capture-and-display loop.
//!
//! Selects one adapter generation, polls it on a fixed interval, and writes
//! the two current output images as PNG snapshots (a headless stand-in for
//! a windowed display). Exits cleanly on ctrl-c or after a frame limit.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use depthcam::{CaptureConfig, DepthCamera, Generation, OutputImage, PixelFormat, UpdateStatus};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Hardware generation (v1 or v2).
    #[arg(long)]
    generation: Option<String>,
    /// Device selector (stub:// for the synthetic driver).
    #[arg(long)]
    device: Option<String>,
    /// Stop after this many polls (0 = run until ctrl-c).
    #[arg(long, default_value_t = 0)]
    frames: u64,
    /// Poll interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Directory for PNG snapshots of the two outputs.
    #[arg(long)]
    snapshots: Option<PathBuf>,
    /// Write snapshots every Nth refreshed poll.
    #[arg(long, default_value_t = 30)]
    snapshot_every: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = CaptureConfig::load()?;
    if let Some(generation) = args.generation.as_deref() {
        cfg.generation = Generation::parse(generation)?;
    }
    if let Some(device) = args.device {
        cfg.device = device;
    }
    if let Some(ms) = args.interval_ms {
        cfg.poll_interval = Duration::from_millis(ms);
    }
    if let Some(dir) = args.snapshots {
        cfg.snapshot_dir = Some(dir);
        cfg.snapshot_every = args.snapshot_every;
    }
    cfg.validate()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("install ctrl-c handler")?;
    }

    let mut camera = DepthCamera::open(&cfg)?;
    if let Some(dir) = &cfg.snapshot_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("create snapshot dir {}", dir.display()))?;
    }

    log::info!(
        "viewer running: generation={}, device={}, interval={}ms",
        cfg.generation,
        cfg.device,
        cfg.poll_interval.as_millis()
    );

    let mut iterations = 0u64;
    let mut refreshed = 0u64;
    let mut last_status: Option<UpdateStatus> = None;
    while running.load(Ordering::SeqCst) {
        let status = camera.update();
        // Log only on transitions; steady state stays quiet.
        if last_status.as_ref() != Some(&status) {
            log::info!(
                "stream status: color={:?}, depth={:?}",
                status.color,
                status.depth
            );
            last_status = Some(status.clone());
        }

        if status.any_refreshed() {
            refreshed += 1;
            if let Some(dir) = &cfg.snapshot_dir {
                if refreshed % cfg.snapshot_every == 0 {
                    if let Err(err) = write_snapshots(dir, &camera) {
                        log::warn!("snapshot write failed: {}", err);
                    }
                }
            }
        }

        iterations += 1;
        if args.frames > 0 && iterations >= args.frames {
            break;
        }
        std::thread::sleep(cfg.poll_interval);
    }

    let stats = camera.stats();
    println!("viewer summary:");
    println!("  polls: {}", stats.polls);
    println!("  color frames: {}", stats.color_frames);
    println!("  depth frames: {}", stats.depth_frames);
    Ok(())
}

fn write_snapshots(dir: &Path, camera: &DepthCamera) -> Result<()> {
    write_png(&dir.join("color.png"), camera.color_output())?;
    write_png(&dir.join("depth.png"), camera.depth_output())?;
    Ok(())
}

fn write_png(path: &Path, image: &OutputImage) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    match image.format() {
        PixelFormat::Bgra8 => {
            // PNG wants RGBA channel order.
            let mut rgba = image.data().to_vec();
            for px in rgba.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            image::save_buffer(path, &rgba, width, height, image::ExtendedColorType::Rgba8)
        }
        PixelFormat::Gray8 => image::save_buffer(
            path,
            image.data(),
            width,
            height,
            image::ExtendedColorType::L8,
        ),
        PixelFormat::Gray16 => {
            // Snapshots flatten full-range depth to its high byte.
            let gray: Vec<u8> = image
                .data()
                .chunks_exact(2)
                .map(|p| (u16::from_le_bytes([p[0], p[1]]) >> 8) as u8)
                .collect();
            image::save_buffer(path, &gray, width, height, image::ExtendedColorType::L8)
        }
    }
    .with_context(|| format!("write snapshot {}", path.display()))
}

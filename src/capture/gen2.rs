//! Newer-generation adapter.
//!
//! SDK model: one default device exposing per-capability frame sources,
//! each read through an acquire-latest reader. Color arrives at full
//! resolution BGRA8 and is downscaled to half size for display; depth
//! arrives as 16-bit millimeters and is remapped into an 8-bit
//! visualization range (near bright, far dark).

use crate::convert;
use crate::driver::{DriverError, FramePoll, ReaderDriver, ReaderHandle, StreamKind};
use crate::pixel::{OutputImage, PixelFormat};

use super::{store_frame, CaptureStats, StreamUpdate, UpdateStatus};

/// Native color resolution of the newer hardware. The color output is
/// delivered at half this size.
pub const GEN2_COLOR_WIDTH: u32 = 1920;
pub const GEN2_COLOR_HEIGHT: u32 = 1080;
/// Native depth resolution of the newer hardware.
pub const GEN2_DEPTH_WIDTH: u32 = 512;
pub const GEN2_DEPTH_HEIGHT: u32 = 424;

/// Adapter for the newer sensor generation.
pub struct GenTwoCamera {
    driver: Box<dyn ReaderDriver>,
    device_open: bool,
    color_reader: Option<ReaderHandle>,
    depth_reader: Option<ReaderHandle>,
    color_buf: Vec<u8>,
    depth_buf: Vec<u8>,
    color_out: OutputImage,
    depth_out: OutputImage,
    stats: CaptureStats,
}

impl GenTwoCamera {
    /// Construct and initialize against `driver`. Same degraded-state
    /// contract as the older generation: construction never fails, faulted
    /// streams report `NotReady`.
    pub fn new(driver: Box<dyn ReaderDriver>) -> Self {
        let mut camera = Self {
            driver,
            device_open: false,
            color_reader: None,
            depth_reader: None,
            color_buf: Vec::new(),
            depth_buf: Vec::new(),
            color_out: OutputImage::zeroed(
                GEN2_COLOR_WIDTH / 2,
                GEN2_COLOR_HEIGHT / 2,
                PixelFormat::Bgra8,
            ),
            depth_out: OutputImage::zeroed(GEN2_DEPTH_WIDTH, GEN2_DEPTH_HEIGHT, PixelFormat::Gray8),
            stats: CaptureStats::default(),
        };
        if let Err(err) = camera.initialize() {
            log::error!("gen2: opening default sensor failed: {}", err);
        }
        camera
    }

    fn initialize(&mut self) -> Result<(), DriverError> {
        self.driver.open_default()?;
        self.device_open = true;

        // Size each output from the driver-reported frame description, so
        // a sensor revision with different native shapes still works.
        match self.driver.frame_description(StreamKind::Color) {
            Ok(desc) => self.color_out.reshape(desc.width / 2, desc.height / 2),
            Err(err) => log::warn!("gen2: color frame description unavailable: {}", err),
        }
        match self.driver.frame_description(StreamKind::Depth) {
            Ok(desc) => self.depth_out.reshape(desc.width, desc.height),
            Err(err) => log::warn!("gen2: depth frame description unavailable: {}", err),
        }

        match self.driver.open_reader(StreamKind::Color) {
            Ok(handle) => self.color_reader = Some(handle),
            Err(err) => log::error!("gen2: opening color reader failed: {}", err),
        }
        match self.driver.open_reader(StreamKind::Depth) {
            Ok(handle) => self.depth_reader = Some(handle),
            Err(err) => log::error!("gen2: opening depth reader failed: {}", err),
        }

        log::info!(
            "gen2: sensor open (color output {}x{}, depth output {}x{})",
            self.color_out.width(),
            self.color_out.height(),
            self.depth_out.width(),
            self.depth_out.height()
        );
        Ok(())
    }

    /// Poll color then depth once each, independently.
    pub fn update(&mut self) -> UpdateStatus {
        self.stats.polls += 1;
        let color = self.update_color();
        let depth = self.update_depth();
        UpdateStatus { color, depth }
    }

    fn update_color(&mut self) -> StreamUpdate {
        let Some(handle) = self.color_reader else {
            return StreamUpdate::NotReady;
        };
        match self.driver.acquire_latest(handle) {
            Ok(FramePoll::NoNewFrame) => StreamUpdate::NoNewFrame,
            Ok(FramePoll::Frame(frame)) => {
                store_frame(&mut self.color_buf, &frame.data);
                match convert::bgra_downscale_half(
                    &self.color_buf,
                    frame.width,
                    frame.height,
                    &mut self.color_out,
                ) {
                    Ok(()) => {
                        self.stats.color_frames += 1;
                        StreamUpdate::Refreshed
                    }
                    Err(err) => {
                        log::warn!("gen2: color frame rejected: {}", err);
                        StreamUpdate::Failed(DriverError::Io(err.to_string()))
                    }
                }
            }
            Err(err) => {
                log::warn!("gen2: color acquire failed: {}", err);
                StreamUpdate::Failed(err)
            }
        }
    }

    fn update_depth(&mut self) -> StreamUpdate {
        let Some(handle) = self.depth_reader else {
            return StreamUpdate::NotReady;
        };
        match self.driver.acquire_latest(handle) {
            Ok(FramePoll::NoNewFrame) => StreamUpdate::NoNewFrame,
            Ok(FramePoll::Frame(frame)) => {
                store_frame(&mut self.depth_buf, &frame.data);
                match convert::depth16_to_vis8(
                    &self.depth_buf,
                    frame.width,
                    frame.height,
                    &mut self.depth_out,
                ) {
                    Ok(()) => {
                        self.stats.depth_frames += 1;
                        StreamUpdate::Refreshed
                    }
                    Err(err) => {
                        log::warn!("gen2: depth frame rejected: {}", err);
                        StreamUpdate::Failed(DriverError::Io(err.to_string()))
                    }
                }
            }
            Err(err) => {
                log::warn!("gen2: depth acquire failed: {}", err);
                StreamUpdate::Failed(err)
            }
        }
    }

    pub fn color_output(&self) -> &OutputImage {
        &self.color_out
    }

    pub fn depth_output(&self) -> &OutputImage {
        &self.depth_out
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Release the depth reader, the color reader, then the device, each at
    /// most once. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(handle) = self.depth_reader.take() {
            self.driver.close_reader(handle);
        }
        if let Some(handle) = self.color_reader.take() {
            self.driver.close_reader(handle);
        }
        if self.device_open {
            self.driver.close();
            self.device_open = false;
        }
    }
}

impl Drop for GenTwoCamera {
    fn drop(&mut self) {
        self.close();
    }
}

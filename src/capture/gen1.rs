//! Older-generation adapter.
//!
//! SDK model: enumerate sensors, pick the first one reporting ready, open a
//! handle per capability stream, then copy one frame per stream per poll.
//! Color arrives as BGRA8 and is passed through byte-for-byte; depth
//! arrives as 16-bit millimeters (near mode, roughly 400-4000 mm) and is
//! kept at full bit depth.

use crate::convert;
use crate::driver::{DriverError, FramePoll, LegacyDriver, StreamHandle, StreamKind};
use crate::pixel::{OutputImage, PixelFormat};

use super::{store_frame, CaptureStats, StreamUpdate, UpdateStatus};

/// Native color resolution of the older hardware.
pub const GEN1_COLOR_WIDTH: u32 = 640;
pub const GEN1_COLOR_HEIGHT: u32 = 480;
/// Native depth resolution of the older hardware.
pub const GEN1_DEPTH_WIDTH: u32 = 320;
pub const GEN1_DEPTH_HEIGHT: u32 = 240;

/// Adapter for the older sensor generation.
pub struct GenOneCamera {
    driver: Box<dyn LegacyDriver>,
    device_open: bool,
    color_stream: Option<StreamHandle>,
    depth_stream: Option<StreamHandle>,
    color_buf: Vec<u8>,
    depth_buf: Vec<u8>,
    color_out: OutputImage,
    depth_out: OutputImage,
    stats: CaptureStats,
}

impl GenOneCamera {
    /// Construct and initialize against `driver`.
    ///
    /// Initialization faults are logged and leave the adapter in a degraded
    /// state: affected streams report `NotReady` from `update()` and their
    /// outputs stay zero-filled at the native shape. Construction itself
    /// never fails.
    pub fn new(driver: Box<dyn LegacyDriver>) -> Self {
        let mut camera = Self {
            driver,
            device_open: false,
            color_stream: None,
            depth_stream: None,
            color_buf: Vec::new(),
            depth_buf: Vec::new(),
            color_out: OutputImage::zeroed(GEN1_COLOR_WIDTH, GEN1_COLOR_HEIGHT, PixelFormat::Bgra8),
            depth_out: OutputImage::zeroed(GEN1_DEPTH_WIDTH, GEN1_DEPTH_HEIGHT, PixelFormat::Gray16),
            stats: CaptureStats::default(),
        };
        if let Err(err) = camera.initialize() {
            log::error!("gen1: no ready sensor: {}", err);
        }
        camera
    }

    fn initialize(&mut self) -> Result<(), DriverError> {
        let count = self.driver.sensor_count()?;
        let mut selected = None;
        for index in 0..count {
            match self.driver.sensor_status(index) {
                Ok(()) => {
                    selected = Some(index);
                    break;
                }
                Err(err) => log::debug!("gen1: sensor {} skipped: {}", index, err),
            }
        }
        let index = selected.ok_or(DriverError::NoDevice)?;
        self.driver.open_sensor(index)?;
        self.device_open = true;

        // Stream-open failures degrade that stream only.
        match self.driver.open_stream(StreamKind::Color) {
            Ok(handle) => self.color_stream = Some(handle),
            Err(err) => log::error!("gen1: opening color stream failed: {}", err),
        }
        match self.driver.open_stream(StreamKind::Depth) {
            Ok(handle) => self.depth_stream = Some(handle),
            Err(err) => log::error!("gen1: opening depth stream failed: {}", err),
        }

        log::info!(
            "gen1: sensor {} ready (color {}x{}, depth {}x{})",
            index,
            GEN1_COLOR_WIDTH,
            GEN1_COLOR_HEIGHT,
            GEN1_DEPTH_WIDTH,
            GEN1_DEPTH_HEIGHT
        );
        Ok(())
    }

    /// Poll color then depth once each. The two sub-operations are
    /// independent; a fault on one leaves the other's outcome and output
    /// unaffected.
    pub fn update(&mut self) -> UpdateStatus {
        self.stats.polls += 1;
        let color = self.update_color();
        let depth = self.update_depth();
        UpdateStatus { color, depth }
    }

    fn update_color(&mut self) -> StreamUpdate {
        let Some(handle) = self.color_stream else {
            return StreamUpdate::NotReady;
        };
        match self.driver.poll_frame(handle) {
            Ok(FramePoll::NoNewFrame) => StreamUpdate::NoNewFrame,
            Ok(FramePoll::Frame(frame)) => {
                store_frame(&mut self.color_buf, &frame.data);
                match convert::bgra_copy(&self.color_buf, frame.width, frame.height, &mut self.color_out)
                {
                    Ok(()) => {
                        self.stats.color_frames += 1;
                        StreamUpdate::Refreshed
                    }
                    Err(err) => {
                        log::warn!("gen1: color frame rejected: {}", err);
                        StreamUpdate::Failed(DriverError::Io(err.to_string()))
                    }
                }
            }
            Err(err) => {
                log::warn!("gen1: color poll failed: {}", err);
                StreamUpdate::Failed(err)
            }
        }
    }

    fn update_depth(&mut self) -> StreamUpdate {
        let Some(handle) = self.depth_stream else {
            return StreamUpdate::NotReady;
        };
        match self.driver.poll_frame(handle) {
            Ok(FramePoll::NoNewFrame) => StreamUpdate::NoNewFrame,
            Ok(FramePoll::Frame(frame)) => {
                store_frame(&mut self.depth_buf, &frame.data);
                match convert::depth16_copy(
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
                        log::warn!("gen1: depth frame rejected: {}", err);
                        StreamUpdate::Failed(DriverError::Io(err.to_string()))
                    }
                }
            }
            Err(err) => {
                log::warn!("gen1: depth poll failed: {}", err);
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

    /// Release the depth stream, the color stream, then the sensor, each at
    /// most once. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(handle) = self.depth_stream.take() {
            self.driver.close_stream(handle);
        }
        if let Some(handle) = self.color_stream.take() {
            self.driver.close_stream(handle);
        }
        if self.device_open {
            self.driver.shutdown();
            self.device_open = false;
        }
    }
}

impl Drop for GenOneCamera {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SyntheticConfig, SyntheticLegacyDriver};

    fn camera() -> GenOneCamera {
        GenOneCamera::new(Box::new(SyntheticLegacyDriver::gen1()))
    }

    #[test]
    fn outputs_are_zeroed_at_native_shape_before_first_update() {
        let camera = camera();
        let color = camera.color_output();
        assert_eq!((color.width(), color.height()), (640, 480));
        assert_eq!(color.format(), PixelFormat::Bgra8);
        assert!(color.data().iter().all(|&b| b == 0));

        let depth = camera.depth_output();
        assert_eq!((depth.width(), depth.height()), (320, 240));
        assert_eq!(depth.format(), PixelFormat::Gray16);
        assert!(depth.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn update_refreshes_both_streams() {
        let mut camera = camera();
        let status = camera.update();
        assert!(status.color.is_refreshed());
        assert!(status.depth.is_refreshed());
        assert!(camera.color_output().data().iter().any(|&b| b != 0));
        assert_eq!(camera.stats().color_frames, 1);
        assert_eq!(camera.stats().depth_frames, 1);
    }

    #[test]
    fn no_new_frame_leaves_outputs_byte_identical() {
        let mut config = SyntheticConfig::gen1();
        config.no_frame_every = 2; // every second poll is a miss
        let mut camera = GenOneCamera::new(Box::new(SyntheticLegacyDriver::new(config)));

        let first = camera.update();
        assert!(first.color.is_refreshed());
        let color_before = camera.color_output().clone();
        let depth_before = camera.depth_output().clone();

        let second = camera.update();
        assert_eq!(second.color, StreamUpdate::NoNewFrame);
        assert_eq!(second.depth, StreamUpdate::NoNewFrame);
        assert_eq!(camera.color_output(), &color_before);
        assert_eq!(camera.depth_output(), &depth_before);
    }

    #[test]
    fn one_stream_fault_does_not_affect_the_other() {
        let mut driver = SyntheticLegacyDriver::gen1();
        driver.inject_poll_fault(StreamKind::Color, DriverError::FrameLock);
        let mut camera = GenOneCamera::new(Box::new(driver));

        let status = camera.update();
        assert_eq!(status.color, StreamUpdate::Failed(DriverError::FrameLock));
        assert!(status.depth.is_refreshed());
        assert!(
            camera.color_output().data().iter().all(|&b| b == 0),
            "failed color stream keeps its initial output"
        );
        assert!(camera.depth_output().data().iter().any(|&b| b != 0));
    }

    #[test]
    fn missing_device_degrades_instead_of_failing() {
        let driver = SyntheticLegacyDriver::without_device(SyntheticConfig::gen1());
        let mut camera = GenOneCamera::new(Box::new(driver));

        let status = camera.update();
        assert_eq!(status.color, StreamUpdate::NotReady);
        assert_eq!(status.depth, StreamUpdate::NotReady);
        assert_eq!(camera.color_output().width(), 640);
        assert!(camera.color_output().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn close_is_idempotent() {
        let mut camera = camera();
        camera.update();
        camera.close();
        camera.close(); // second close must be a no-op
        let status = camera.update();
        assert_eq!(status.color, StreamUpdate::NotReady);
        assert_eq!(status.depth, StreamUpdate::NotReady);
    }
}

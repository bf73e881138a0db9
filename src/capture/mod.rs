//! Capture adapters.
//!
//! One adapter per hardware generation, behind the closed `DepthCamera`
//! enum. Each adapter owns its device/stream handles, two raw frame
//! buffers, and two output images; the caller drives a synchronous loop of
//! `update()` followed by reads of both outputs.
//!
//! The adapters are responsible for:
//! - Selecting and opening a device at construction
//! - Polling each stream once per `update()`, independently
//! - Copying vendor bytes into owned frame buffers (realloc only on growth)
//! - Deriving the display-ready output image per generation
//!
//! The adapters MUST NOT:
//! - Fail construction (initialization faults degrade to `NotReady` streams)
//! - Expose mutable access to the output images
//! - Tear an output on a failed poll (previous contents stay intact)

mod gen1;
mod gen2;

pub use gen1::{
    GenOneCamera, GEN1_COLOR_HEIGHT, GEN1_COLOR_WIDTH, GEN1_DEPTH_HEIGHT, GEN1_DEPTH_WIDTH,
};
pub use gen2::{
    GenTwoCamera, GEN2_COLOR_HEIGHT, GEN2_COLOR_WIDTH, GEN2_DEPTH_HEIGHT, GEN2_DEPTH_WIDTH,
};

use anyhow::{anyhow, Result};

use crate::config::{CaptureConfig, Generation};
use crate::driver::{DriverError, SyntheticLegacyDriver, SyntheticReaderDriver};
use crate::pixel::OutputImage;

/// Outcome of one per-stream sub-operation inside `update()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamUpdate {
    /// A new frame was decoded into the output image.
    Refreshed,
    /// The driver had nothing new; the output is untouched.
    NoNewFrame,
    /// The stream was never opened; the output is still its initial state.
    NotReady,
    /// Driver or decode fault this poll; the output is untouched.
    Failed(DriverError),
}

impl StreamUpdate {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, StreamUpdate::Refreshed)
    }
}

/// Per-`update()` status for both streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateStatus {
    pub color: StreamUpdate,
    pub depth: StreamUpdate,
}

impl UpdateStatus {
    pub fn any_refreshed(&self) -> bool {
        self.color.is_refreshed() || self.depth.is_refreshed()
    }
}

/// Running counters for an adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureStats {
    pub polls: u64,
    pub color_frames: u64,
    pub depth_frames: u64,
}

/// Copy a vendor frame into an owned buffer. `Vec` reuses its allocation,
/// so a reallocation happens only when the frame outgrows the capacity seen
/// so far.
pub(crate) fn store_frame(buf: &mut Vec<u8>, src: &[u8]) {
    buf.clear();
    buf.extend_from_slice(src);
}

/// The closed set of supported hardware generations.
pub enum DepthCamera {
    GenOne(GenOneCamera),
    GenTwo(GenTwoCamera),
}

impl DepthCamera {
    /// Build the adapter for the configured generation and device.
    ///
    /// `stub://` device selectors get the synthetic driver. Anything else
    /// needs a real SDK binding implementing the driver traits, which this
    /// crate does not carry.
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        if !config.device.starts_with("stub://") {
            return Err(anyhow!(
                "no driver for device '{}'; only stub:// synthetic devices are built in",
                config.device
            ));
        }
        Ok(match config.generation {
            Generation::V1 => {
                DepthCamera::GenOne(GenOneCamera::new(Box::new(SyntheticLegacyDriver::gen1())))
            }
            Generation::V2 => {
                DepthCamera::GenTwo(GenTwoCamera::new(Box::new(SyntheticReaderDriver::gen2())))
            }
        })
    }

    /// Poll both streams once. Never fails; per-stream outcomes are in the
    /// returned status, and faults are additionally logged.
    pub fn update(&mut self) -> UpdateStatus {
        match self {
            DepthCamera::GenOne(camera) => camera.update(),
            DepthCamera::GenTwo(camera) => camera.update(),
        }
    }

    /// Most recent color output. Zero-filled until the first successful poll.
    pub fn color_output(&self) -> &OutputImage {
        match self {
            DepthCamera::GenOne(camera) => camera.color_output(),
            DepthCamera::GenTwo(camera) => camera.color_output(),
        }
    }

    /// Most recent depth output. Zero-filled until the first successful poll.
    pub fn depth_output(&self) -> &OutputImage {
        match self {
            DepthCamera::GenOne(camera) => camera.depth_output(),
            DepthCamera::GenTwo(camera) => camera.depth_output(),
        }
    }

    pub fn stats(&self) -> CaptureStats {
        match self {
            DepthCamera::GenOne(camera) => camera.stats(),
            DepthCamera::GenTwo(camera) => camera.stats(),
        }
    }

    /// Release streams and the device, reverse-acquisition order. Also runs
    /// on drop; calling it twice is a no-op.
    pub fn close(&mut self) {
        match self {
            DepthCamera::GenOne(camera) => camera.close(),
            DepthCamera::GenTwo(camera) => camera.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelFormat;

    #[test]
    fn store_frame_reuses_allocation_at_steady_size() {
        let mut buf = Vec::new();
        let frame = vec![1u8; 4096];
        store_frame(&mut buf, &frame);
        let ptr = buf.as_ptr();
        let cap = buf.capacity();
        for _ in 0..10 {
            store_frame(&mut buf, &frame);
        }
        assert_eq!(buf.as_ptr(), ptr, "steady-size frames must not reallocate");
        assert_eq!(buf.capacity(), cap);
    }

    #[test]
    fn store_frame_grows_for_larger_frames() {
        let mut buf = Vec::new();
        store_frame(&mut buf, &vec![1u8; 16]);
        let cap = buf.capacity();
        store_frame(&mut buf, &vec![2u8; 4096]);
        assert!(buf.capacity() > cap);
        assert_eq!(buf.len(), 4096);
    }

    #[test]
    fn open_rejects_non_stub_devices() {
        let config = CaptureConfig {
            device: "usb://0".to_string(),
            ..CaptureConfig::default()
        };
        assert!(DepthCamera::open(&config).is_err());
    }

    #[test]
    fn open_builds_the_configured_generation() {
        let mut config = CaptureConfig::default();
        config.generation = Generation::V2;
        let camera = DepthCamera::open(&config).unwrap();
        assert_eq!(camera.depth_output().format(), PixelFormat::Gray8);

        config.generation = Generation::V1;
        let camera = DepthCamera::open(&config).unwrap();
        assert_eq!(camera.depth_output().format(), PixelFormat::Gray16);
    }
}

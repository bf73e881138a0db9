//! Synthetic in-process drivers.
//!
//! Deterministic stand-ins for the vendor SDKs, used by the test suite and
//! by `stub://` device selectors in the demo loop. Frames are arithmetic
//! patterns keyed on the poll counter, so consecutive polls differ and a
//! given poll is reproducible. Knobs cover the awkward driver behaviors the
//! adapters must survive: "no new frame" cadence, absent or not-ready
//! sensors, and injected per-stream faults.

use std::collections::HashMap;

use super::{
    DriverError, FrameDescription, FramePoll, LegacyDriver, RawFrame, ReaderDriver, ReaderHandle,
    StreamHandle, StreamKind,
};

/// Scene parameters for a synthetic driver.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub color_width: u32,
    pub color_height: u32,
    pub depth_width: u32,
    pub depth_height: u32,
    /// Every Nth poll per stream reports no new frame (0 disables).
    pub no_frame_every: u64,
    /// Reported depth span in millimeters (min at the top row, max at the
    /// bottom row).
    pub depth_range_mm: (u16, u16),
}

impl SyntheticConfig {
    /// Older-generation native shapes: 640x480 color, 320x240 depth,
    /// near-mode depth span.
    pub fn gen1() -> Self {
        Self {
            color_width: 640,
            color_height: 480,
            depth_width: 320,
            depth_height: 240,
            no_frame_every: 0,
            depth_range_mm: (400, 4000),
        }
    }

    /// Newer-generation native shapes: 1920x1080 color, 512x424 depth,
    /// full-range depth span.
    pub fn gen2() -> Self {
        Self {
            color_width: 1920,
            color_height: 1080,
            depth_width: 512,
            depth_height: 424,
            no_frame_every: 0,
            depth_range_mm: (500, 8000),
        }
    }
}

fn color_frame(width: u32, height: u32, tick: u64) -> RawFrame {
    let w = width as usize;
    let h = height as usize;
    let mut data = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let off = (y * w + x) * 4;
            data[off] = ((x as u64 + tick) % 256) as u8;
            data[off + 1] = ((y as u64 + tick) % 256) as u8;
            data[off + 2] = ((x + y) % 256) as u8;
            data[off + 3] = 255;
        }
    }
    RawFrame {
        width,
        height,
        data,
    }
}

fn depth_frame(width: u32, height: u32, range_mm: (u16, u16), tick: u64) -> RawFrame {
    let w = width as usize;
    let h = height as usize;
    let (min, max) = range_mm;
    let span = max.saturating_sub(min) as u64;
    let mut data = vec![0u8; w * h * 2];
    for y in 0..h {
        // Row ramp from min to max, drifting a little per tick so motion
        // is visible between polls.
        let ramp = if h > 1 { span * y as u64 / (h as u64 - 1) } else { 0 };
        let drift = (tick * 8) % 64;
        let value = (min as u64 + ramp + drift).min(max as u64) as u16;
        let bytes = value.to_le_bytes();
        for x in 0..w {
            let off = (y * w + x) * 2;
            data[off] = bytes[0];
            data[off + 1] = bytes[1];
        }
    }
    RawFrame {
        width,
        height,
        data,
    }
}

#[derive(Default)]
struct StreamState {
    polls: u64,
    fault: Option<DriverError>,
}

impl StreamState {
    fn next(
        &mut self,
        kind: StreamKind,
        config: &SyntheticConfig,
    ) -> Result<FramePoll, DriverError> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        self.polls += 1;
        if config.no_frame_every > 0 && self.polls % config.no_frame_every == 0 {
            return Ok(FramePoll::NoNewFrame);
        }
        let frame = match kind {
            StreamKind::Color => color_frame(config.color_width, config.color_height, self.polls),
            StreamKind::Depth => depth_frame(
                config.depth_width,
                config.depth_height,
                config.depth_range_mm,
                self.polls,
            ),
        };
        Ok(FramePoll::Frame(frame))
    }
}

// ----------------------------------------------------------------------------
// Older-generation synthetic driver
// ----------------------------------------------------------------------------

/// Synthetic `LegacyDriver` with a single always-ready sensor.
pub struct SyntheticLegacyDriver {
    config: SyntheticConfig,
    sensor_present: bool,
    opened: bool,
    next_handle: u32,
    streams: HashMap<StreamHandle, StreamKind>,
    states: HashMap<StreamKind, StreamState>,
}

impl SyntheticLegacyDriver {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            sensor_present: true,
            opened: false,
            next_handle: 1,
            streams: HashMap::new(),
            states: HashMap::new(),
        }
    }

    pub fn gen1() -> Self {
        Self::new(SyntheticConfig::gen1())
    }

    /// Variant reporting zero sensors, for degraded-init paths.
    pub fn without_device(config: SyntheticConfig) -> Self {
        let mut driver = Self::new(config);
        driver.sensor_present = false;
        driver
    }

    /// Make every subsequent poll on `kind` fail with `error`.
    pub fn inject_poll_fault(&mut self, kind: StreamKind, error: DriverError) {
        self.states.entry(kind).or_default().fault = Some(error);
    }
}

impl LegacyDriver for SyntheticLegacyDriver {
    fn sensor_count(&mut self) -> Result<usize, DriverError> {
        Ok(if self.sensor_present { 1 } else { 0 })
    }

    fn sensor_status(&mut self, index: usize) -> Result<(), DriverError> {
        if self.sensor_present && index == 0 {
            Ok(())
        } else {
            Err(DriverError::NotReady)
        }
    }

    fn open_sensor(&mut self, index: usize) -> Result<(), DriverError> {
        if !self.sensor_present || index != 0 {
            return Err(DriverError::NoDevice);
        }
        self.opened = true;
        Ok(())
    }

    fn open_stream(&mut self, kind: StreamKind) -> Result<StreamHandle, DriverError> {
        if !self.opened {
            return Err(DriverError::NotReady);
        }
        let handle = StreamHandle::new(self.next_handle);
        self.next_handle += 1;
        self.streams.insert(handle, kind);
        self.states.entry(kind).or_default();
        Ok(handle)
    }

    fn poll_frame(&mut self, stream: StreamHandle) -> Result<FramePoll, DriverError> {
        let kind = *self
            .streams
            .get(&stream)
            .ok_or_else(|| DriverError::Io("unknown stream handle".to_string()))?;
        self.states
            .entry(kind)
            .or_default()
            .next(kind, &self.config)
    }

    fn close_stream(&mut self, stream: StreamHandle) {
        self.streams.remove(&stream);
    }

    fn shutdown(&mut self) {
        if self.opened {
            log::info!("synthetic legacy driver shut down");
        }
        self.opened = false;
        self.streams.clear();
    }
}

// ----------------------------------------------------------------------------
// Newer-generation synthetic driver
// ----------------------------------------------------------------------------

/// Synthetic `ReaderDriver` with an always-present default device.
pub struct SyntheticReaderDriver {
    config: SyntheticConfig,
    device_present: bool,
    opened: bool,
    next_handle: u32,
    readers: HashMap<ReaderHandle, StreamKind>,
    states: HashMap<StreamKind, StreamState>,
}

impl SyntheticReaderDriver {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            device_present: true,
            opened: false,
            next_handle: 1,
            readers: HashMap::new(),
            states: HashMap::new(),
        }
    }

    pub fn gen2() -> Self {
        Self::new(SyntheticConfig::gen2())
    }

    /// Variant with no default device, for degraded-init paths.
    pub fn without_device(config: SyntheticConfig) -> Self {
        let mut driver = Self::new(config);
        driver.device_present = false;
        driver
    }

    /// Make every subsequent acquire on `kind` fail with `error`.
    pub fn inject_poll_fault(&mut self, kind: StreamKind, error: DriverError) {
        self.states.entry(kind).or_default().fault = Some(error);
    }
}

impl ReaderDriver for SyntheticReaderDriver {
    fn open_default(&mut self) -> Result<(), DriverError> {
        if !self.device_present {
            return Err(DriverError::NoDevice);
        }
        self.opened = true;
        Ok(())
    }

    fn frame_description(&mut self, kind: StreamKind) -> Result<FrameDescription, DriverError> {
        if !self.opened {
            return Err(DriverError::NotReady);
        }
        Ok(match kind {
            StreamKind::Color => FrameDescription {
                width: self.config.color_width,
                height: self.config.color_height,
            },
            StreamKind::Depth => FrameDescription {
                width: self.config.depth_width,
                height: self.config.depth_height,
            },
        })
    }

    fn open_reader(&mut self, kind: StreamKind) -> Result<ReaderHandle, DriverError> {
        if !self.opened {
            return Err(DriverError::NotReady);
        }
        let handle = ReaderHandle::new(self.next_handle);
        self.next_handle += 1;
        self.readers.insert(handle, kind);
        self.states.entry(kind).or_default();
        Ok(handle)
    }

    fn acquire_latest(&mut self, reader: ReaderHandle) -> Result<FramePoll, DriverError> {
        let kind = *self
            .readers
            .get(&reader)
            .ok_or_else(|| DriverError::Io("unknown reader handle".to_string()))?;
        self.states
            .entry(kind)
            .or_default()
            .next(kind, &self.config)
    }

    fn close_reader(&mut self, reader: ReaderHandle) {
        self.readers.remove(&reader);
    }

    fn close(&mut self) {
        if self.opened {
            log::info!("synthetic reader driver closed");
        }
        self.opened = false;
        self.readers.clear();
    }
}

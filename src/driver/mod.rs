//! Sensor driver seam.
//!
//! The vendor SDKs are external collaborators; this module pins down the
//! slice of their contracts the adapters rely on:
//! - Enumeration returns zero or more candidate sensors; at most one is opened.
//! - Frame polls are non-blocking or bounded, and "no new frame yet" is a
//!   normal outcome distinct from a fault.
//! - Reported frame sizes may vary poll to poll.
//! - Release calls are idempotent.
//!
//! Real SDK bindings implement `LegacyDriver` (older generation: explicit
//! enumeration plus per-stream handles) or `ReaderDriver` (newer generation:
//! frame sources read through acquire-latest readers). The `synthetic`
//! module ships deterministic in-process drivers for tests and the demo.

use std::fmt;

pub mod synthetic;

pub use synthetic::{SyntheticConfig, SyntheticLegacyDriver, SyntheticReaderDriver};

/// Which of the two capability streams a handle refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Color,
    Depth,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Color => write!(f, "color"),
            StreamKind::Depth => write!(f, "depth"),
        }
    }
}

/// Driver fault classes. Opaque vendor status codes are folded into these
/// at the driver boundary; adapters never see raw codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverError {
    /// Enumeration found no sensor at all.
    NoDevice,
    /// A sensor exists but is not in a ready state.
    NotReady,
    /// The requested capability stream could not be opened.
    StreamUnavailable(StreamKind),
    /// A frame arrived but its buffer could not be locked or copied.
    FrameLock,
    /// Transport-level fault, carrying the driver's own message.
    Io(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::NoDevice => write!(f, "no sensor found"),
            DriverError::NotReady => write!(f, "sensor not ready"),
            DriverError::StreamUnavailable(kind) => write!(f, "{} stream unavailable", kind),
            DriverError::FrameLock => write!(f, "frame buffer lock failed"),
            DriverError::Io(msg) => write!(f, "driver i/o fault: {}", msg),
        }
    }
}

impl std::error::Error for DriverError {}

/// One vendor-delivered frame. The byte layout depends on the stream:
/// BGRA8 for color, little-endian 16-bit millimeters for depth.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Outcome of a non-blocking frame poll.
#[derive(Clone, Debug)]
pub enum FramePoll {
    /// A new frame since the previous poll.
    Frame(RawFrame),
    /// Nothing new yet; the previous frame stands.
    NoNewFrame,
}

/// Reported shape of a stream, available before any frame is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDescription {
    pub width: u32,
    pub height: u32,
}

/// Opaque per-stream handle issued by a `LegacyDriver`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StreamHandle(u32);

impl StreamHandle {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque reader handle issued by a `ReaderDriver`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReaderHandle(u32);

impl ReaderHandle {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Older-generation SDK shape: enumerate sensors, open one, then open a
/// handle per capability stream and poll each for copied frames.
pub trait LegacyDriver {
    fn sensor_count(&mut self) -> Result<usize, DriverError>;

    /// Status probe for the sensor at `index`; `Ok(())` means ready.
    fn sensor_status(&mut self, index: usize) -> Result<(), DriverError>;

    fn open_sensor(&mut self, index: usize) -> Result<(), DriverError>;

    fn open_stream(&mut self, kind: StreamKind) -> Result<StreamHandle, DriverError>;

    /// Poll for the next frame on `stream`. Non-blocking apart from the
    /// driver's own bounded wait.
    fn poll_frame(&mut self, stream: StreamHandle) -> Result<FramePoll, DriverError>;

    /// Release a stream handle. Releasing an unknown or already-released
    /// handle is a no-op.
    fn close_stream(&mut self, stream: StreamHandle);

    /// Release the sensor itself. Idempotent.
    fn shutdown(&mut self);
}

/// Newer-generation SDK shape: one default device exposing per-capability
/// frame sources, each read through an acquire-latest reader.
pub trait ReaderDriver {
    fn open_default(&mut self) -> Result<(), DriverError>;

    /// Shape the source will deliver for `kind`.
    fn frame_description(&mut self, kind: StreamKind) -> Result<FrameDescription, DriverError>;

    fn open_reader(&mut self, kind: StreamKind) -> Result<ReaderHandle, DriverError>;

    /// Acquire the latest frame on `reader`, if one arrived since the
    /// previous acquire.
    fn acquire_latest(&mut self, reader: ReaderHandle) -> Result<FramePoll, DriverError>;

    /// Release a reader. Idempotent.
    fn close_reader(&mut self, reader: ReaderHandle);

    /// Close the device. Idempotent.
    fn close(&mut self);
}

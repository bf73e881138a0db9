//! depthcam - uniform capture layer over two depth-camera generations.
//!
//! Two generations of a depth-camera sensor SDK (an older enumerate-and-poll
//! model and a newer frame-source/reader model) are exposed as one uniform
//! surface: a polled source of two image buffers, color and depth. The
//! caller drives a single-threaded loop of `DepthCamera::update()` followed
//! by reads of both outputs; a failed poll leaves the previous output
//! intact, never torn.
//!
//! # Module structure, leaves first
//!
//! - `pixel`: output pixel grids (`OutputImage`, `PixelFormat`)
//! - `driver`: the vendor SDK contract, plus synthetic in-process drivers
//! - `convert`: per-generation format/resolution normalization
//! - `capture`: the two adapters and the uniform `DepthCamera` surface
//! - `config`: file + env configuration for the viewer loop

pub mod capture;
pub mod config;
pub mod convert;
pub mod driver;
pub mod pixel;

pub use capture::{CaptureStats, DepthCamera, GenOneCamera, GenTwoCamera, StreamUpdate, UpdateStatus};
pub use config::{CaptureConfig, Generation};
pub use pixel::{OutputImage, PixelFormat};

//! Output image buffers.
//!
//! `OutputImage` is the display-ready pixel grid an adapter exposes to the
//! caller: a fixed shape plus an owned byte buffer. Adapters overwrite it in
//! place on every refreshed poll; callers only ever see `&OutputImage` and
//! must not retain the reference across the next poll.

/// Pixel layout of an `OutputImage`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit blue/green/red/alpha, 4 bytes per pixel.
    Bgra8,
    /// 8-bit grayscale, used for depth visualization.
    Gray8,
    /// 16-bit little-endian grayscale, used for full-range depth.
    Gray16,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 => 4,
            PixelFormat::Gray8 => 1,
            PixelFormat::Gray16 => 2,
        }
    }
}

/// A fixed-shape pixel grid owned by an adapter.
///
/// The buffer length is always `width * height * bytes_per_pixel`. A fresh
/// image is zero-filled; after that the contents are whatever the most
/// recent successfully decoded frame produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl OutputImage {
    /// Zero-initialized image of the given shape.
    pub fn zeroed(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0u8; byte_len(width, height, format)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Read-only view of the pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Adopt a new shape, re-zeroing the buffer. No-op when the shape is
    /// already current, so steady-state polls never churn the allocation.
    pub(crate) fn reshape(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(byte_len(width, height, self.format), 0);
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

fn byte_len(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * format.bytes_per_pixel()
}

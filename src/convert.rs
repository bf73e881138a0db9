//! Pixel format and resolution normalization.
//!
//! Conversions from the raw vendor frame layout into the display-ready
//! `OutputImage`, one set per hardware generation. Every function validates
//! the source byte length against the reported dimensions before touching
//! the output, so a short or malformed vendor buffer never leaves a partial
//! image behind.

use anyhow::{anyhow, Result};

use crate::pixel::{OutputImage, PixelFormat};

/// Full depth range of the newer sensor generation, in millimeters.
/// Depths at or beyond this map to black in the 8-bit visualization.
pub const GEN2_DEPTH_MAX_MM: u32 = 8000;

fn expect_len(width: u32, height: u32, bytes_per_pixel: usize) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(bytes_per_pixel))
        .ok_or_else(|| anyhow!("frame dimensions overflow: {}x{}", width, height))
}

fn check_len(src: &[u8], width: u32, height: u32, bytes_per_pixel: usize) -> Result<()> {
    let expected = expect_len(width, height, bytes_per_pixel)?;
    if src.len() != expected {
        return Err(anyhow!(
            "frame length mismatch for {}x{}: expected {}, got {}",
            width,
            height,
            expected,
            src.len()
        ));
    }
    Ok(())
}

/// Byte-for-byte BGRA8 pass-through (older generation color path).
pub fn bgra_copy(src: &[u8], width: u32, height: u32, out: &mut OutputImage) -> Result<()> {
    check_len(src, width, height, 4)?;
    debug_assert_eq!(out.format(), PixelFormat::Bgra8);
    out.reshape(width, height);
    out.data_mut().copy_from_slice(src);
    Ok(())
}

/// 2x2 box average producing a half-resolution BGRA8 image (newer
/// generation color path). Odd trailing rows/columns are dropped.
pub fn bgra_downscale_half(src: &[u8], width: u32, height: u32, out: &mut OutputImage) -> Result<()> {
    check_len(src, width, height, 4)?;
    debug_assert_eq!(out.format(), PixelFormat::Bgra8);
    let out_w = width / 2;
    let out_h = height / 2;
    out.reshape(out_w, out_h);

    let src_stride = width as usize * 4;
    let dst = out.data_mut();
    for oy in 0..out_h as usize {
        for ox in 0..out_w as usize {
            let top = oy * 2 * src_stride + ox * 2 * 4;
            let bottom = top + src_stride;
            let dst_off = (oy * out_w as usize + ox) * 4;
            for c in 0..4 {
                let sum = src[top + c] as u32
                    + src[top + 4 + c] as u32
                    + src[bottom + c] as u32
                    + src[bottom + 4 + c] as u32;
                dst[dst_off + c] = (sum / 4) as u8;
            }
        }
    }
    Ok(())
}

/// 16-bit depth preserved at full bit depth (older generation depth path).
pub fn depth16_copy(src: &[u8], width: u32, height: u32, out: &mut OutputImage) -> Result<()> {
    check_len(src, width, height, 2)?;
    debug_assert_eq!(out.format(), PixelFormat::Gray16);
    out.reshape(width, height);
    out.data_mut().copy_from_slice(src);
    Ok(())
}

/// 16-bit millimeter depth remapped into an 8-bit visualization range
/// (newer generation depth path): `out = 255 - d * 255 / 8000`, clamped.
/// Near surfaces render bright, far and out-of-range ones dark.
pub fn depth16_to_vis8(src: &[u8], width: u32, height: u32, out: &mut OutputImage) -> Result<()> {
    check_len(src, width, height, 2)?;
    debug_assert_eq!(out.format(), PixelFormat::Gray8);
    out.reshape(width, height);

    let dst = out.data_mut();
    for (i, pair) in src.chunks_exact(2).enumerate() {
        let depth_mm = u16::from_le_bytes([pair[0], pair[1]]) as u32;
        let scaled = depth_mm * 255 / GEN2_DEPTH_MAX_MM;
        dst[i] = 255u32.saturating_sub(scaled) as u8;
    }
    Ok(())
}

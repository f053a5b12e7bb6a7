//! RGB565 frame view

use crate::config::{PanelGeometry, BYTES_PER_PIXEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Byte count differs from `width * height * 2`
    WrongSize { expected: usize, actual: usize },
    /// Frame and bit-planes describe different panels
    GeometryMismatch,
}

/// A decoded frame payload
///
/// Borrows the wire bytes; pixels are little-endian RGB565 in row-major
/// order.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    geometry: PanelGeometry,
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(geometry: PanelGeometry, bytes: &'a [u8]) -> Result<Self, FrameError> {
        let expected = geometry.frame_bytes();
        if bytes.len() != expected {
            return Err(FrameError::WrongSize {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self { geometry, bytes })
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// Pixel at column `x` of logical row `y`
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        let index = (y * self.geometry.width() + x) * BYTES_PER_PIXEL;
        u16::from_le_bytes([self.bytes[index], self.bytes[index + 1]])
    }

    /// One logical row of pixels
    pub fn row(&self, y: usize) -> impl Iterator<Item = u16> + 'a {
        let stride = self.geometry.width() * BYTES_PER_PIXEL;
        self.bytes[y * stride..(y + 1) * stride]
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|p| u16::from_le_bytes([p[0], p[1]]))
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Split an RGB565 pixel into 8-bit channels
///
/// Each channel is left-aligned, so full scale is 248 for red and blue and
/// 252 for green.
#[inline]
pub const fn rgb565_to_rgb888(pixel: u16) -> (u8, u8, u8) {
    let r = ((pixel >> 11) & 0x1F) << 3;
    let g = ((pixel >> 5) & 0x3F) << 2;
    let b = (pixel & 0x1F) << 3;
    (r as u8, g as u8, b as u8)
}

/// Pack 8-bit channels into RGB565, dropping the low bits
#[inline]
pub const fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

//! Binary code modulation encoder
//!
//! A frame is split into `COLOR_DEPTH` one-bit planes per scan row. The scan
//! driver shows plane `b` for `2^b` time units, so the time-integrated
//! brightness of each sub-pixel equals its corrected channel value.
//!
//! ```text
//!  planes: [row 0: bit 0 | bit 1 | ... | bit 5][row 1: bit 0 | ...] ...
//!           └ width packed bytes each, column order
//! ```

use hublink_hal::SubPixel;

use crate::config::{PanelGeometry, COLOR_DEPTH};
use crate::frame::{rgb565_to_rgb888, Frame, FrameError};
use crate::gamma::GammaTable;

/// Bit-planes for one frame, indexed by scan row, bit and column
///
/// Each byte packs the six sub-pixels of one column using the
/// [`SubPixel`] masks.
#[derive(Debug)]
pub struct BitPlaneSet<'a> {
    geometry: PanelGeometry,
    planes: &'a mut [u8],
}

impl<'a> BitPlaneSet<'a> {
    /// Wrap `storage`, which must be exactly `geometry.plane_bytes()` long
    ///
    /// The set starts blank.
    pub fn new(geometry: PanelGeometry, storage: &'a mut [u8]) -> Result<Self, FrameError> {
        let expected = geometry.plane_bytes();
        if storage.len() != expected {
            return Err(FrameError::WrongSize {
                expected,
                actual: storage.len(),
            });
        }
        storage.fill(0);
        Ok(Self {
            geometry,
            planes: storage,
        })
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// Packed column bytes for one (row, bit) pair
    #[inline]
    pub fn plane(&self, row: usize, bit: usize) -> &[u8] {
        let start = self.offset(row, bit);
        &self.planes[start..start + self.geometry.width()]
    }

    fn plane_mut(&mut self, row: usize, bit: usize) -> &mut [u8] {
        let start = self.offset(row, bit);
        let width = self.geometry.width();
        &mut self.planes[start..start + width]
    }

    #[inline]
    fn offset(&self, row: usize, bit: usize) -> usize {
        (row * COLOR_DEPTH + bit) * self.geometry.width()
    }

    /// Blank every plane
    pub fn clear(&mut self) {
        self.planes.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.planes
    }

    /// Raw packed bytes, for drawing test patterns directly
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        self.planes
    }
}

/// Converts RGB565 frames into bit-planes
#[derive(Debug, Clone)]
pub struct BcmEncoder {
    gamma: GammaTable,
}

impl BcmEncoder {
    pub fn new(gamma: GammaTable) -> Self {
        Self { gamma }
    }

    /// Reduce one 8-bit channel to `COLOR_DEPTH` corrected bits
    #[inline]
    fn channel(&self, value: u8) -> u8 {
        self.gamma.apply(value) >> (8 - COLOR_DEPTH)
    }

    fn corrected(&self, pixel: u16) -> [u8; 3] {
        let (r, g, b) = rgb565_to_rgb888(pixel);
        [self.channel(r), self.channel(g), self.channel(b)]
    }

    /// Encode `frame` into `planes`
    ///
    /// Scan row `r` carries logical row `r` on the upper half and
    /// `r + scan_rows` on the lower half. Fails without touching `planes`
    /// when the two describe different geometries.
    pub fn encode(
        &self,
        frame: &Frame<'_>,
        planes: &mut BitPlaneSet<'_>,
    ) -> Result<(), FrameError> {
        let geometry = planes.geometry();
        if frame.geometry() != geometry {
            return Err(FrameError::GeometryMismatch);
        }
        let rows = geometry.scan_rows();

        for row in 0..rows {
            for (col, (upper, lower)) in frame.row(row).zip(frame.row(row + rows)).enumerate() {
                let [ur, ug, ub] = self.corrected(upper);
                let [lr, lg, lb] = self.corrected(lower);
                let channels = [
                    (ur, SubPixel::UpperRed),
                    (ug, SubPixel::UpperGreen),
                    (ub, SubPixel::UpperBlue),
                    (lr, SubPixel::LowerRed),
                    (lg, SubPixel::LowerGreen),
                    (lb, SubPixel::LowerBlue),
                ];

                for bit in 0..COLOR_DEPTH {
                    let packed = channels
                        .iter()
                        .filter(|(value, _)| (value >> bit) & 1 != 0)
                        .fold(0u8, |acc, (_, sub)| acc | sub.mask());
                    planes.plane_mut(row, bit)[col] = packed;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::rgb888_to_rgb565;
    use proptest::prelude::*;

    fn frame_bytes(geometry: PanelGeometry, pixels: &[u16]) -> Vec<u8> {
        assert_eq!(pixels.len(), geometry.pixel_count());
        pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    /// Time-weighted brightness of one sub-pixel at (row, col)
    fn brightness(planes: &BitPlaneSet<'_>, row: usize, col: usize, sub: SubPixel) -> u32 {
        (0..COLOR_DEPTH)
            .filter(|&bit| sub.is_set(planes.plane(row, bit)[col]))
            .map(|bit| 1u32 << bit)
            .sum()
    }

    #[test]
    fn test_storage_size_checked() {
        let geometry = PanelGeometry::new(4, 4).unwrap();
        let mut storage = vec![0u8; geometry.plane_bytes() - 1];
        assert!(BitPlaneSet::new(geometry, &mut storage).is_err());
    }

    #[test]
    fn test_geometry_mismatch_rejected() {
        // Same byte count, different shape
        let frame_geometry = PanelGeometry::new(8, 2).unwrap();
        let plane_geometry = PanelGeometry::new(4, 4).unwrap();
        assert_eq!(frame_geometry.frame_bytes(), plane_geometry.frame_bytes());

        let bytes = frame_bytes(frame_geometry, &[0xFFFF; 16]);
        let frame = Frame::new(frame_geometry, &bytes).unwrap();
        let mut storage = vec![0u8; plane_geometry.plane_bytes()];
        let mut planes = BitPlaneSet::new(plane_geometry, &mut storage).unwrap();

        assert_eq!(
            BcmEncoder::new(GammaTable::identity()).encode(&frame, &mut planes),
            Err(FrameError::GeometryMismatch)
        );
        assert!(planes.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_full_white_lights_every_plane() {
        let geometry = PanelGeometry::new(4, 4).unwrap();
        let bytes = frame_bytes(geometry, &[0xFFFF; 16]);
        let frame = Frame::new(geometry, &bytes).unwrap();
        let mut storage = vec![0u8; geometry.plane_bytes()];
        let mut planes = BitPlaneSet::new(geometry, &mut storage).unwrap();

        BcmEncoder::new(GammaTable::identity()).encode(&frame, &mut planes).unwrap();

        // 248 >> 2 = 62 and 252 >> 2 = 63: red and blue lack bit 0
        for row in 0..2 {
            assert_eq!(planes.plane(row, 0), &[0x12; 4]);
            for bit in 1..COLOR_DEPTH {
                assert_eq!(planes.plane(row, bit), &[0x3F; 4]);
            }
        }
    }

    #[test]
    fn test_upper_and_lower_halves() {
        let geometry = PanelGeometry::new(2, 4).unwrap();
        let red = rgb888_to_rgb565(255, 0, 0);
        let blue = rgb888_to_rgb565(0, 0, 255);
        // Logical rows 0..1 are the upper half, 2..3 the lower half
        let pixels = [red, 0, 0, 0, 0, blue, 0, 0];
        let bytes = frame_bytes(geometry, &pixels);
        let frame = Frame::new(geometry, &bytes).unwrap();
        let mut storage = vec![0u8; geometry.plane_bytes()];
        let mut planes = BitPlaneSet::new(geometry, &mut storage).unwrap();

        BcmEncoder::new(GammaTable::identity()).encode(&frame, &mut planes).unwrap();

        let top = planes.plane(0, COLOR_DEPTH - 1);
        assert_eq!(top[0], SubPixel::UpperRed.mask());
        assert_eq!(top[1], SubPixel::LowerBlue.mask());
        assert!(planes.plane(1, COLOR_DEPTH - 1).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_black_frame_is_blank() {
        let geometry = PanelGeometry::new(8, 4).unwrap();
        let bytes = vec![0u8; geometry.frame_bytes()];
        let frame = Frame::new(geometry, &bytes).unwrap();
        let mut storage = vec![0xFFu8; geometry.plane_bytes()];
        let mut planes = BitPlaneSet::new(geometry, &mut storage).unwrap();

        BcmEncoder::new(GammaTable::new(2.2)).encode(&frame, &mut planes).unwrap();
        assert!(planes.as_bytes().iter().all(|&b| b == 0));
    }

    proptest! {
        #[test]
        fn prop_brightness_non_decreasing(
            a in 0u8..=255,
            b in 0u8..=255,
            gamma in 0.5f32..3.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let geometry = PanelGeometry::new(2, 2).unwrap();
            let pixels = [rgb888_to_rgb565(0, lo, 0), rgb888_to_rgb565(0, hi, 0), 0, 0];
            let bytes = frame_bytes(geometry, &pixels);
            let frame = Frame::new(geometry, &bytes).unwrap();
            let mut storage = vec![0u8; geometry.plane_bytes()];
            let mut planes = BitPlaneSet::new(geometry, &mut storage).unwrap();

            BcmEncoder::new(GammaTable::new(gamma)).encode(&frame, &mut planes).unwrap();

            let dim = brightness(&planes, 0, 0, SubPixel::UpperGreen);
            let bright = brightness(&planes, 0, 1, SubPixel::UpperGreen);
            prop_assert!(dim <= bright);
            prop_assert_eq!(brightness(&planes, 0, 0, SubPixel::UpperRed), 0);
        }
    }
}

//! Panel geometry and the buffer sizes derived from it

use hublink_protocol::{required_capacity, FramingMode};

/// Bits per colour channel after gamma correction
pub const COLOR_DEPTH: usize = 6;

/// Widest supported chain of panels, in pixels
pub const MAX_WIDTH: u16 = 512;

/// Row address lines available on the connector (A-E)
pub const MAX_ADDRESS_LINES: usize = 5;

/// Most scan rows addressable with [`MAX_ADDRESS_LINES`]
pub const MAX_SCAN_ROWS: u16 = 1 << MAX_ADDRESS_LINES;

/// Bytes per RGB565 pixel on the wire
pub const BYTES_PER_PIXEL: usize = 2;

/// Geometry validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Width is zero or above [`MAX_WIDTH`]
    WidthOutOfRange(u16),
    /// Height does not split into an upper and lower half
    OddHeight(u16),
    /// Scan row count is not a power of two up to [`MAX_SCAN_ROWS`]
    UnsupportedScanRows(u16),
}

/// Validated panel dimensions
///
/// Two physical rows share each scan row, so `height / 2` rows are
/// addressed and the lower half is driven alongside the upper half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelGeometry {
    width: u16,
    height: u16,
}

impl PanelGeometry {
    /// Validate and build a geometry
    pub const fn new(width: u16, height: u16) -> Result<Self, GeometryError> {
        if width == 0 || width > MAX_WIDTH {
            return Err(GeometryError::WidthOutOfRange(width));
        }
        if height == 0 || height % 2 != 0 {
            return Err(GeometryError::OddHeight(height));
        }
        let rows = height / 2;
        if !rows.is_power_of_two() || rows > MAX_SCAN_ROWS {
            return Err(GeometryError::UnsupportedScanRows(rows));
        }
        Ok(Self { width, height })
    }

    pub const fn width(&self) -> usize {
        self.width as usize
    }

    pub const fn height(&self) -> usize {
        self.height as usize
    }

    /// Row address values driven per refresh cycle
    pub const fn scan_rows(&self) -> usize {
        self.height() / 2
    }

    /// Address lines needed to select every scan row
    pub const fn address_lines(&self) -> usize {
        self.scan_rows().trailing_zeros() as usize
    }

    pub const fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Serialized size of one frame payload
    pub const fn frame_bytes(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Size of one complete bit-plane set
    pub const fn plane_bytes(&self) -> usize {
        self.scan_rows() * COLOR_DEPTH * self.width()
    }

    /// Receive buffer needed to accumulate one frame in `mode`
    pub const fn receive_capacity(&self, mode: FramingMode) -> usize {
        required_capacity(mode, self.frame_bytes())
    }
}

impl Default for PanelGeometry {
    /// A single 128x32 panel (1/16 scan)
    fn default() -> Self {
        Self {
            width: 128,
            height: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes() {
        let geometry = PanelGeometry::default();
        assert_eq!(geometry.scan_rows(), 16);
        assert_eq!(geometry.address_lines(), 4);
        assert_eq!(geometry.frame_bytes(), 8192);
        assert_eq!(geometry.plane_bytes(), 16 * 6 * 128);
        assert_eq!(PanelGeometry::new(128, 32), Ok(geometry));
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert_eq!(
            PanelGeometry::new(0, 32),
            Err(GeometryError::WidthOutOfRange(0))
        );
        assert_eq!(
            PanelGeometry::new(1024, 32),
            Err(GeometryError::WidthOutOfRange(1024))
        );
        assert_eq!(PanelGeometry::new(64, 31), Err(GeometryError::OddHeight(31)));
        assert_eq!(
            PanelGeometry::new(64, 24),
            Err(GeometryError::UnsupportedScanRows(12))
        );
        assert_eq!(
            PanelGeometry::new(64, 128),
            Err(GeometryError::UnsupportedScanRows(64))
        );
    }

    #[test]
    fn test_address_lines() {
        assert_eq!(PanelGeometry::new(32, 2).unwrap().address_lines(), 0);
        assert_eq!(PanelGeometry::new(64, 16).unwrap().address_lines(), 3);
        assert_eq!(PanelGeometry::new(64, 64).unwrap().address_lines(), 5);
    }

    #[test]
    fn test_receive_capacity_grows_with_mode() {
        let geometry = PanelGeometry::default();
        let text = geometry.receive_capacity(FramingMode::Text);
        let stuffed = geometry.receive_capacity(FramingMode::Stuffed);
        assert!(text > stuffed);
        assert!(geometry.receive_capacity(FramingMode::Auto) >= text);
    }
}

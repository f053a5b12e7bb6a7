//! Pixel shift-out abstraction
//!
//! A HUB75 panel is a long chain of shift registers. Each clock edge moves
//! six colour bits (upper and lower half of the active scan line) one column
//! along the chain.

/// Bits of a packed pixel byte that carry colour data
pub const PIXEL_MASK: u8 = 0x3F;

/// Position of each colour sub-pixel inside a packed pixel byte
///
/// The order matches the six consecutive data lines of the HUB75
/// connector (R1 G1 B1 R2 G2 B2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SubPixel {
    UpperRed = 0x01,
    UpperGreen = 0x02,
    UpperBlue = 0x04,
    LowerRed = 0x08,
    LowerGreen = 0x10,
    LowerBlue = 0x20,
}

impl SubPixel {
    /// All sub-pixels in wire order
    pub const ALL: [SubPixel; 6] = [
        SubPixel::UpperRed,
        SubPixel::UpperGreen,
        SubPixel::UpperBlue,
        SubPixel::LowerRed,
        SubPixel::LowerGreen,
        SubPixel::LowerBlue,
    ];

    /// Get the sub-pixel's bit mask
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Check whether this sub-pixel is lit in a packed byte
    pub const fn is_set(self, packed: u8) -> bool {
        packed & self.mask() != 0
    }
}

/// Pixel shifter
///
/// Implementations either drive the data/clock lines directly (bit-banged)
/// or feed a hardware output queue (PIO). The choice is made once at
/// configuration time; the refresh loop only sees this trait.
pub trait PixelShifter {
    /// Clock one packed pixel into the panel chain
    ///
    /// Only the low six bits are meaningful. Each call transmits exactly one
    /// pixel before returning; if a hardware queue is full the call blocks
    /// until there is room. There is no timeout.
    fn shift_byte(&mut self, value: u8);

    /// Block until every pixel handed to `shift_byte` has reached the panel
    ///
    /// Synchronous shifters are always drained, so the default is a no-op.
    fn flush(&mut self) {}
}

impl<T: PixelShifter + ?Sized> PixelShifter for &mut T {
    fn shift_byte(&mut self, value: u8) {
        (**self).shift_byte(value)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_pixel_masks_cover_pixel_mask() {
        let combined = SubPixel::ALL.iter().fold(0u8, |acc, s| acc | s.mask());
        assert_eq!(combined, PIXEL_MASK);
    }

    #[test]
    fn test_sub_pixel_is_set() {
        assert!(SubPixel::LowerGreen.is_set(0x10));
        assert!(!SubPixel::LowerGreen.is_set(0x2F));
    }
}

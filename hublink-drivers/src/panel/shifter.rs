//! Bit-banged pixel shifter
//!
//! Drives the six colour data lines and the shift clock directly from the
//! CPU. Slower than the PIO shifter but works on any pin assignment.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use hublink_hal::{PixelShifter, SubPixel};

/// Software pixel shifter
///
/// Data lines are ordered R1 G1 B1 R2 G2 B2, matching the bit order of a
/// packed pixel byte. The panel samples data on the rising clock edge.
pub struct BitBangShifter<P> {
    data: [P; 6],
    clock: P,
}

impl<P> BitBangShifter<P>
where
    P: OutputPin<Error = Infallible>,
{
    /// Create a shifter; all lines start low
    pub fn new(data: [P; 6], clock: P) -> Self {
        let mut shifter = Self { data, clock };
        for pin in shifter.data.iter_mut() {
            let _ = pin.set_low();
        }
        let _ = shifter.clock.set_low();
        shifter
    }

    /// Give the pins back
    pub fn release(self) -> ([P; 6], P) {
        (self.data, self.clock)
    }
}

impl<P> PixelShifter for BitBangShifter<P>
where
    P: OutputPin<Error = Infallible>,
{
    fn shift_byte(&mut self, value: u8) {
        for (pin, sub) in self.data.iter_mut().zip(SubPixel::ALL) {
            let _ = pin.set_state(sub.is_set(value).into());
        }
        let _ = self.clock.set_high();
        let _ = self.clock.set_low();
    }
}

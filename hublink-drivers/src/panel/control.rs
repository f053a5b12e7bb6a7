//! GPIO panel control
//!
//! Row address lines, latch strobe and output-enable gate, each on its own
//! GPIO.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use heapless::Vec;
use hublink_hal::PanelControl;

/// Address lines on the HUB75 connector (A-E)
pub const MAX_ADDRESS_PINS: usize = 5;

/// Panel control over plain GPIO outputs
pub struct GpioPanelControl<P> {
    /// Address lines, least significant first
    address: Vec<P, MAX_ADDRESS_PINS>,
    latch: P,
    output_enable: P,
    /// If true, output is enabled when the pin is LOW
    oe_inverted: bool,
    /// Busy-wait iterations between latch assert and deassert
    latch_hold: u32,
}

impl<P> GpioPanelControl<P>
where
    P: OutputPin<Error = Infallible>,
{
    /// Create panel control; the panel starts blanked with the latch low
    ///
    /// # Arguments
    /// - `address`: row address pins, least significant first
    /// - `oe_inverted`: output enable is active-low (standard HUB75)
    pub fn new(address: Vec<P, MAX_ADDRESS_PINS>, latch: P, output_enable: P, oe_inverted: bool) -> Self {
        let mut control = Self {
            address,
            latch,
            output_enable,
            oe_inverted,
            latch_hold: 0,
        };
        control.set_output_enabled(false);
        let _ = control.latch.set_low();
        control
    }

    /// Stretch the latch pulse by `iterations` spin-loop hints
    pub fn with_latch_hold(mut self, iterations: u32) -> Self {
        self.latch_hold = iterations;
        self
    }

    /// Number of address lines driven
    pub fn address_lines(&self) -> usize {
        self.address.len()
    }
}

impl<P> PanelControl for GpioPanelControl<P>
where
    P: OutputPin<Error = Infallible>,
{
    fn set_address(&mut self, row: u8) {
        for (bit, pin) in self.address.iter_mut().enumerate() {
            let _ = pin.set_state(((row >> bit) & 1 != 0).into());
        }
    }

    fn latch(&mut self) {
        let _ = self.latch.set_high();
        for _ in 0..self.latch_hold {
            core::hint::spin_loop();
        }
        let _ = self.latch.set_low();
    }

    fn set_output_enabled(&mut self, enabled: bool) {
        let _ = self.output_enable.set_state((enabled != self.oe_inverted).into());
    }
}

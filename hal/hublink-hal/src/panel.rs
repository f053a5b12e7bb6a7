//! Panel control lines
//!
//! Everything on the HUB75 connector other than the colour data and its
//! clock: the row address lines, the latch strobe and the output-enable gate.

/// Panel control
///
/// The refresh loop relies on the following ordering per scan line:
/// blank, shift, address, latch, unblank, hold, blank. Implementations only
/// have to make each call take effect before returning.
pub trait PanelControl {
    /// Drive the row address lines to the binary value of `row`
    fn set_address(&mut self, row: u8);

    /// Pulse the latch strobe (assert, hold, deassert)
    ///
    /// Commits the shifted pixel data into the panel's output drivers.
    fn latch(&mut self);

    /// Gate the LED outputs
    ///
    /// `true` lights the latched row, `false` blanks the panel.
    /// Implementations handle the connector's active-low polarity.
    fn set_output_enabled(&mut self, enabled: bool);

    /// Blank the panel
    fn blank(&mut self) {
        self.set_output_enabled(false);
    }

    /// Light the latched row
    fn unblank(&mut self) {
        self.set_output_enabled(true);
    }
}

impl<T: PanelControl + ?Sized> PanelControl for &mut T {
    fn set_address(&mut self, row: u8) {
        (**self).set_address(row)
    }

    fn latch(&mut self) {
        (**self).latch()
    }

    fn set_output_enabled(&mut self, enabled: bool) {
        (**self).set_output_enabled(enabled)
    }
}

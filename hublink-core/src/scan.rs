//! Panel scan driver
//!
//! One refresh cycle walks every bit-plane (outer) of every scan row
//! (inner). Per step the panel is blanked, the row's packed pixels are
//! shifted in from the last column to the first, the row address is set,
//! the data is latched and the row is lit for `unit << bit` microseconds.
//! Output is never enabled while the latch strobes.

use embedded_hal::delay::DelayNs;
use hublink_hal::{PanelControl, PixelShifter};

use crate::bcm::BitPlaneSet;
use crate::config::{COLOR_DEPTH, MAX_BCM_UNIT_US};

pub struct ScanDriver<S, P, D> {
    shifter: S,
    panel: P,
    delay: D,
    unit_us: u32,
}

impl<S, P, D> ScanDriver<S, P, D>
where
    S: PixelShifter,
    P: PanelControl,
    D: DelayNs,
{
    /// Create a driver; the panel is blanked immediately
    ///
    /// `unit_us` is the display time of bit-plane 0, clamped to
    /// 1..=[`MAX_BCM_UNIT_US`].
    pub fn new(shifter: S, mut panel: P, delay: D, unit_us: u32) -> Self {
        panel.blank();
        Self {
            shifter,
            panel,
            delay,
            unit_us: unit_us.clamp(1, MAX_BCM_UNIT_US),
        }
    }

    /// Show every bit-plane of every scan row once
    pub fn refresh_cycle(&mut self, planes: &BitPlaneSet<'_>) {
        let rows = planes.geometry().scan_rows();

        for bit in 0..COLOR_DEPTH {
            for row in 0..rows {
                self.scan_row(planes.plane(row, bit), row as u8, bit);
            }
        }
    }

    #[inline]
    fn scan_row(&mut self, pixels: &[u8], row: u8, bit: usize) {
        self.panel.blank();

        // The first byte shifted in ends up in the last column
        for &packed in pixels.iter().rev() {
            self.shifter.shift_byte(packed);
        }
        self.shifter.flush();

        self.panel.set_address(row);
        self.panel.latch();

        self.panel.unblank();
        self.delay.delay_us(self.unit_us << bit);
        self.panel.blank();
    }

    /// Refresh `planes` forever
    pub fn run(&mut self, planes: &BitPlaneSet<'_>) -> ! {
        loop {
            self.refresh_cycle(planes);
        }
    }

    /// Duration of one full refresh cycle's lit time, in microseconds
    pub fn lit_time_us(&self, scan_rows: usize) -> u32 {
        let weights = (1u32 << COLOR_DEPTH) - 1;
        self.unit_us
            .saturating_mul(weights)
            .saturating_mul(scan_rows as u32)
    }

    pub fn blank(&mut self) {
        self.panel.blank();
    }

    /// Give the hardware back
    pub fn release(self) -> (S, P, D) {
        (self.shifter, self.panel, self.delay)
    }
}

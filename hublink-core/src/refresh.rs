//! Refresh-side composition
//!
//! Owns the consumer end of the handoff, the bit-plane set and the scan
//! driver. At the top of each cycle a newly published frame (if any) is
//! encoded; the cycle then shows the current planes. The bit-planes never
//! leave the refresh context, so encoding cannot race the scan.

use embedded_hal::delay::DelayNs;
use hublink_hal::{PanelControl, PixelShifter};

use crate::bcm::{BcmEncoder, BitPlaneSet};
use crate::frame::Frame;
use crate::handoff::FrameConsumer;
use crate::scan::ScanDriver;

pub struct Refresher<'h, 'a, 'p, S, P, D> {
    consumer: FrameConsumer<'h, 'a>,
    encoder: BcmEncoder,
    planes: BitPlaneSet<'p>,
    driver: ScanDriver<S, P, D>,
    frames_taken: u32,
}

impl<'h, 'a, 'p, S, P, D> Refresher<'h, 'a, 'p, S, P, D>
where
    S: PixelShifter,
    P: PanelControl,
    D: DelayNs,
{
    pub fn new(
        consumer: FrameConsumer<'h, 'a>,
        encoder: BcmEncoder,
        planes: BitPlaneSet<'p>,
        driver: ScanDriver<S, P, D>,
    ) -> Self {
        Self {
            consumer,
            encoder,
            planes,
            driver,
            frames_taken: 0,
        }
    }

    /// Encode the newest published frame, if there is one
    ///
    /// Returns `true` when the planes changed.
    pub fn poll_frame(&mut self) -> bool {
        let geometry = self.planes.geometry();
        let Some(bytes) = self.consumer.take_if_new() else {
            return false;
        };
        // Slots are sized from the same geometry, so this only fails on a
        // wiring mistake; keep showing the previous frame in that case.
        let Ok(frame) = Frame::new(geometry, bytes) else {
            return false;
        };
        if self.encoder.encode(&frame, &mut self.planes).is_err() {
            return false;
        }
        self.frames_taken = self.frames_taken.wrapping_add(1);
        true
    }

    /// Pick up a new frame, then show one full refresh cycle
    pub fn cycle(&mut self) {
        self.poll_frame();
        self.driver.refresh_cycle(&self.planes);
    }

    /// Refresh forever
    pub fn run(&mut self) -> ! {
        loop {
            self.cycle();
        }
    }

    /// Frames encoded since start
    pub fn frames_taken(&self) -> u32 {
        self.frames_taken
    }
}

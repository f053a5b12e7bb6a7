//! PIO pixel shifter
//!
//! Feeds packed pixels to a PIO state machine running the shift program
//! from [`crate::pio`]. Data pins must be six consecutive GPIOs in
//! R1 G1 B1 R2 G2 B2 order; the clock is driven by side-set.

use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, FifoJoin, Instance, Pin, ShiftConfig,
    ShiftDirection, StateMachine,
};
use fixed::types::U24F8;
use hublink_hal::{PixelShifter, PIXEL_MASK};

use crate::pio::divider_bits;

/// PIO pixel shifter
///
/// Owns its state machine and the PIO pins so the pin functions stay
/// assigned for as long as the shifter lives.
pub struct PioShifter<'d, PIO: Instance, const SM: usize> {
    /// PIO state machine running the shift program
    sm: StateMachine<'d, PIO, SM>,
    _data: [Pin<'d, PIO>; 6],
    _clock: Pin<'d, PIO>,
}

impl<'d, PIO: Instance, const SM: usize> PioShifter<'d, PIO, SM> {
    /// Create and start a PIO pixel shifter
    ///
    /// # Arguments
    /// * `common` - PIO common resources (for loading program)
    /// * `sm` - State machine to use
    /// * `data` - Colour data pins, consecutive GPIOs in wire order
    /// * `clock` - Shift clock pin, driven by side-set
    /// * `shift_hz` - Target pixel rate
    pub fn new(
        common: &mut Common<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        data: [Pin<'d, PIO>; 6],
        clock: Pin<'d, PIO>,
        shift_hz: u32,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".side_set 1",
            ".wrap_target",
            "pull block side 0",
            "out pins, 6 side 0 [1]",
            "nop side 1 [1]",
            ".wrap"
        );

        let installed = common.load_program(&prg.program);

        let mut cfg = Config::default();
        cfg.use_program(&installed, &[&clock]);
        cfg.set_out_pins(&[&data[0], &data[1], &data[2], &data[3], &data[4], &data[5]]);
        cfg.shift_out = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Right,
            auto_fill: false,
        };
        // Output only, so both FIFOs serve TX
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg.clock_divider = U24F8::from_bits(divider_bits(shift_hz));

        sm.set_config(&cfg);
        sm.set_pin_dirs(
            PioDirection::Out,
            &[&data[0], &data[1], &data[2], &data[3], &data[4], &data[5], &clock],
        );
        sm.set_enable(true);

        Self {
            sm,
            _data: data,
            _clock: clock,
        }
    }

    /// Change the pixel rate
    pub fn set_shift_clock(&mut self, shift_hz: u32) {
        self.flush();
        self.sm.set_clock_divider(U24F8::from_bits(divider_bits(shift_hz)));
    }
}

impl<PIO: Instance, const SM: usize> PixelShifter for PioShifter<'_, PIO, SM> {
    fn shift_byte(&mut self, value: u8) {
        let word = (value & PIXEL_MASK) as u32;
        while !self.sm.tx().try_push(word) {
            core::hint::spin_loop();
        }
    }

    fn flush(&mut self) {
        while !self.sm.tx().empty() {
            core::hint::spin_loop();
        }
        // The stall flag is sticky; clear it so only a stall on the final
        // pull counts
        let _ = self.sm.tx().stalled();
        while !self.sm.tx().stalled() {
            core::hint::spin_loop();
        }
    }
}

//! Panel hardware bring-up
//!
//! Turns the parsed [`PanelConfig`] into a pixel shifter and panel control
//! on real pins. The shifter kind is chosen here, once.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{Common, StateMachine};
use heapless::Vec;

use hublink_core::config::{PanelPins, ShifterKind};
use hublink_core::PanelConfig;
use hublink_drivers::panel::control::MAX_ADDRESS_PINS;
use hublink_drivers::{BitBangShifter, GpioPanelControl};
use hublink_hal::PixelShifter;
use hublink_hal_rp2040::pins::{PinBank, PinBankPeripherals, PinError};
use hublink_hal_rp2040::pio::{effective_shift_clock, DEFAULT_SHIFT_CLOCK_HZ};
use hublink_hal_rp2040::PioShifter;

/// Spin-loop hints between latch assert and deassert
const LATCH_HOLD_SPINS: u32 = 4;

/// Pixel shifter selected at bring-up
pub enum PanelShifter {
    Pio(PioShifter<'static, PIO0, 0>),
    BitBang(BitBangShifter<Output<'static>>),
}

impl PixelShifter for PanelShifter {
    #[inline]
    fn shift_byte(&mut self, value: u8) {
        match self {
            PanelShifter::Pio(s) => s.shift_byte(value),
            PanelShifter::BitBang(s) => s.shift_byte(value),
        }
    }

    fn flush(&mut self) {
        match self {
            PanelShifter::Pio(s) => s.flush(),
            PanelShifter::BitBang(s) => s.flush(),
        }
    }
}

pub type PanelControl = GpioPanelControl<Output<'static>>;

/// Claim the PIO pins when the PIO shifter is configured and routable
///
/// Must run before the remaining pins go into the [`PinBank`].
pub fn pio_shifter(
    config: &PanelConfig,
    common: &mut Common<'static, PIO0>,
    sm: StateMachine<'static, PIO0, 0>,
    gpio: &mut PinBankPeripherals,
) -> Option<PanelShifter> {
    if config.shifter != ShifterKind::Pio {
        return None;
    }
    match gpio.take_pio_panel_pins(common, &config.pins) {
        Ok((data, clock)) => {
            info!(
                "PIO shifter at {} Hz",
                effective_shift_clock(DEFAULT_SHIFT_CLOCK_HZ)
            );
            Some(PanelShifter::Pio(PioShifter::new(
                common,
                sm,
                data,
                clock,
                DEFAULT_SHIFT_CLOCK_HZ,
            )))
        }
        Err(e) => {
            warn!("PIO shifter unavailable ({:?}), falling back to bit-bang", e);
            None
        }
    }
}

/// Build the bit-banged shifter from banked pins
pub fn bitbang_shifter(bank: &mut PinBank, pins: &PanelPins) -> Result<PanelShifter, PinError> {
    let [r1, g1, b1, r2, g2, b2] = pins.data;
    let data = [
        bank.take_output(r1)?,
        bank.take_output(g1)?,
        bank.take_output(b1)?,
        bank.take_output(r2)?,
        bank.take_output(g2)?,
        bank.take_output(b2)?,
    ];
    let clock = bank.take_output(pins.clock)?;
    info!("Bit-bang shifter");
    Ok(PanelShifter::BitBang(BitBangShifter::new(data, clock)))
}

/// Build address, latch and output-enable control from banked pins
pub fn panel_control(bank: &mut PinBank, pins: &PanelPins) -> Result<PanelControl, PinError> {
    if pins
        .iter()
        .any(|p| p.inverted && p.pin != pins.output_enable.pin)
    {
        warn!("Pin inversion is only honoured on output_enable");
    }

    let mut address: Vec<Output<'static>, MAX_ADDRESS_PINS> = Vec::new();
    for pin in pins.address.iter() {
        // Both vectors hold at most five entries
        let _ = address.push(bank.take_output(*pin)?);
    }
    let latch = bank.take_output(pins.latch)?;
    let output_enable = bank.take_output(pins.output_enable)?;

    Ok(
        GpioPanelControl::new(address, latch, output_enable, pins.output_enable.inverted)
            .with_latch_hold(LATCH_HOLD_SPINS),
    )
}

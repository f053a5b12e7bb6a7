//! Pin allocation for config-driven panel setup
//!
//! Panel pins come from `panel.toml` as GPIO numbers, so most of them are
//! handed out by number from a [`PinBank`]. Peripherals that need a
//! concrete pin type (the PIO data/clock lines and the UART) take theirs
//! from [`PinBankPeripherals`] first; whatever is left goes into the bank.

use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_rp::peripherals;
use embassy_rp::pio::{Common, Instance, Pin};
use embassy_rp::{Peri, Peripherals};
use hublink_core::config::{LinkSettings, PanelPins, PinConfig};

/// Number of user GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// First colour data pin the PIO shifter is wired for
pub const PIO_DATA_BASE: u8 = 0;

/// Shift clock pin the PIO shifter is wired for
pub const PIO_CLOCK_PIN: u8 = 6;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin assignment not routable to the requested peripheral
    Unsupported,
}

macro_rules! pin_bank_peripherals {
    ($($field:ident: $periph:ident = $num:literal),* $(,)?) => {
        /// GPIO pins not yet claimed
        ///
        /// Using Option allows taking pins individually by their concrete
        /// type before the rest are moved into a [`PinBank`].
        pub struct PinBankPeripherals {
            $(pub $field: Option<Peri<'static, peripherals::$periph>>,)*
        }

        impl PinBankPeripherals {
            /// Split the GPIO pins off the chip peripherals
            pub fn from_peripherals(p: Peripherals) -> (Self, RemainingPeripherals) {
                let pins = Self {
                    $($field: Some(p.$periph),)*
                };
                let remaining = RemainingPeripherals {
                    pio0: p.PIO0,
                    uart0: p.UART0,
                    core1: p.CORE1,
                };
                (pins, remaining)
            }
        }

        impl PinBank {
            /// Move every unclaimed pin into a bank
            pub fn new(p: PinBankPeripherals) -> Self {
                let mut pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT] =
                    [const { None }; GPIO_COUNT];
                $(pins[$num] = p.$field.map(Into::into);)*
                Self { pins }
            }
        }
    };
}

pin_bank_peripherals! {
    pin0: PIN_0 = 0, pin1: PIN_1 = 1, pin2: PIN_2 = 2, pin3: PIN_3 = 3,
    pin4: PIN_4 = 4, pin5: PIN_5 = 5, pin6: PIN_6 = 6, pin7: PIN_7 = 7,
    pin8: PIN_8 = 8, pin9: PIN_9 = 9, pin10: PIN_10 = 10, pin11: PIN_11 = 11,
    pin12: PIN_12 = 12, pin13: PIN_13 = 13, pin14: PIN_14 = 14, pin15: PIN_15 = 15,
    pin16: PIN_16 = 16, pin17: PIN_17 = 17, pin18: PIN_18 = 18, pin19: PIN_19 = 19,
    pin20: PIN_20 = 20, pin21: PIN_21 = 21, pin22: PIN_22 = 22, pin23: PIN_23 = 23,
    pin24: PIN_24 = 24, pin25: PIN_25 = 25, pin26: PIN_26 = 26, pin27: PIN_27 = 27,
    pin28: PIN_28 = 28, pin29: PIN_29 = 29,
}

/// Non-GPIO peripherals the firmware needs
pub struct RemainingPeripherals {
    pub pio0: Peri<'static, peripherals::PIO0>,
    pub uart0: Peri<'static, peripherals::UART0>,
    pub core1: Peri<'static, peripherals::CORE1>,
}

impl PinBankPeripherals {
    /// Claim the colour data and clock pins for the PIO shifter
    ///
    /// Only the board wiring (data on GP0-5, clock on GP6) is routable.
    pub fn take_pio_panel_pins<PIO: Instance>(
        &mut self,
        common: &mut Common<'static, PIO>,
        pins: &PanelPins,
    ) -> Result<([Pin<'static, PIO>; 6], Pin<'static, PIO>), PinError> {
        if !pio_wiring_supported(pins) {
            return Err(PinError::Unsupported);
        }
        let taken = (
            self.pin0.take(),
            self.pin1.take(),
            self.pin2.take(),
            self.pin3.take(),
            self.pin4.take(),
            self.pin5.take(),
            self.pin6.take(),
        );
        let (Some(r1), Some(g1), Some(b1), Some(r2), Some(g2), Some(b2), Some(clk)) = taken
        else {
            return Err(PinError::AlreadyTaken);
        };
        let data = [
            common.make_pio_pin(r1),
            common.make_pio_pin(g1),
            common.make_pio_pin(b1),
            common.make_pio_pin(r2),
            common.make_pio_pin(g2),
            common.make_pio_pin(b2),
        ];
        Ok((data, common.make_pio_pin(clk)))
    }
}

/// Check whether the panel wiring matches what the PIO shifter drives
pub fn pio_wiring_supported(pins: &PanelPins) -> bool {
    pins.data_base() == Some(PIO_DATA_BASE)
        && pins.clock.pin == PIO_CLOCK_PIN
        && !pins.clock.inverted
}

/// Check whether the link pins are a UART0 TX/RX pair
pub fn uart0_pins_supported(link: &LinkSettings) -> bool {
    matches!(
        (link.tx_pin, link.rx_pin),
        (0, 1) | (12, 13) | (16, 17) | (28, 29)
    )
}

/// Pin bank that holds GPIO pins and allows taking them by number
///
/// This enables config-driven pin assignment where pin numbers come from
/// `panel.toml` rather than being hardcoded.
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Take a pin by number
    ///
    /// Returns the pin if available, or an error if:
    /// - Pin number is invalid (>= 30)
    /// - Pin was already taken
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin)?
            .take()
            .ok_or(PinError::AlreadyTaken)
    }

    /// Take a pin and drive it at its inactive level
    pub fn take_output(&mut self, pin: PinConfig) -> Result<Output<'static>, PinError> {
        let level = if pin.level(false) { Level::High } else { Level::Low };
        Ok(Output::new(self.take(pin.pin)?, level))
    }

    /// Check if a pin is available
    pub fn is_available(&self, pin_num: u8) -> bool {
        self.pins
            .get(pin_num as usize)
            .is_some_and(|p| p.is_some())
    }
}

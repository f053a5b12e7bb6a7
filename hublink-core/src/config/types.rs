//! Configuration type definitions
//!
//! These types describe one panel installation. They are built once at boot
//! from the embedded `panel.toml` and never change afterwards.

use heapless::Vec;

pub use hublink_protocol::FramingMode;

use super::geometry::{GeometryError, PanelGeometry, MAX_ADDRESS_LINES};

/// Highest GPIO number on the target chip
pub const MAX_GPIO: u8 = 29;

/// Colour data lines on the connector (R1 G1 B1 R2 G2 B2)
pub const DATA_PINS: usize = 6;

/// Longest accepted least-significant bit-plane time, in microseconds
///
/// The most significant plane holds for 32 units, so this keeps one row
/// under 64 ms.
pub const MAX_BCM_UNIT_US: u32 = 1000;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not recognised in its section
    UnknownKey,
    /// Value could not be parsed for its key
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// More entries than the fixed capacity allows
    TooManyItems,
    /// Panel dimensions rejected
    Geometry(GeometryError),
    /// Fewer address pins than the geometry needs
    AddressLines { required: usize, configured: usize },
    /// The same GPIO is assigned twice
    DuplicatePin(u8),
    /// Gamma exponent must be finite and positive
    InvalidGamma,
}

impl From<GeometryError> for ConfigError {
    fn from(e: GeometryError) -> Self {
        ConfigError::Geometry(e)
    }
}

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO number
    pub pin: u8,
    /// Pin is active-low
    pub inverted: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an active-low pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }

    /// Electrical level that represents `active`
    pub const fn level(&self, active: bool) -> bool {
        active != self.inverted
    }
}

/// HUB75 connector wiring
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelPins {
    /// Colour data lines in connector order
    pub data: [PinConfig; DATA_PINS],
    /// Shift clock
    pub clock: PinConfig,
    /// Latch strobe
    pub latch: PinConfig,
    /// Output enable (normally active-low)
    pub output_enable: PinConfig,
    /// Row address lines, least significant first
    pub address: Vec<PinConfig, MAX_ADDRESS_LINES>,
}

impl PanelPins {
    /// Iterate over every assigned pin
    pub fn iter(&self) -> impl Iterator<Item = &PinConfig> {
        self.data
            .iter()
            .chain([&self.clock, &self.latch, &self.output_enable])
            .chain(self.address.iter())
    }

    /// First data pin, if the data lines occupy consecutive GPIOs in order
    pub fn data_base(&self) -> Option<u8> {
        let base = self.data[0].pin;
        let consecutive = self
            .data
            .iter()
            .enumerate()
            .all(|(i, p)| usize::from(p.pin) == usize::from(base) + i && !p.inverted);
        consecutive.then_some(base)
    }
}

impl Default for PanelPins {
    /// GP0-5 colour, GP6 clock, GP7 latch, GP8 output enable, GP9-12 address
    fn default() -> Self {
        let mut address = Vec::new();
        for pin in 9..=12 {
            // Capacity is MAX_ADDRESS_LINES, four always fit
            let _ = address.push(PinConfig::new(pin));
        }
        Self {
            data: [
                PinConfig::new(0),
                PinConfig::new(1),
                PinConfig::new(2),
                PinConfig::new(3),
                PinConfig::new(4),
                PinConfig::new(5),
            ],
            clock: PinConfig::new(6),
            latch: PinConfig::new(7),
            output_enable: PinConfig::inverted(8),
            address,
        }
    }
}

/// How pixels are shifted into the panel chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShifterKind {
    /// Programmable I/O state machine, needs consecutive data pins
    #[default]
    Pio,
    /// Direct GPIO writes from the refresh core
    BitBang,
}

/// Serial link settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkSettings {
    /// Accepted framing schemes
    pub framing: FramingMode,
    /// UART baud rate
    pub baudrate: u32,
    /// UART TX pin
    pub tx_pin: u8,
    /// UART RX pin
    pub rx_pin: u8,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            framing: FramingMode::Auto,
            baudrate: 115_200,
            tx_pin: 16,
            rx_pin: 17,
        }
    }
}

/// Complete panel installation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    /// Panel dimensions
    pub geometry: PanelGeometry,
    /// Gamma exponent applied to every channel
    pub gamma: f32,
    /// Display time of the least significant bit-plane, in microseconds
    pub bcm_unit_us: u32,
    /// Connector wiring
    pub pins: PanelPins,
    /// Serial link
    pub link: LinkSettings,
    /// Pixel shifter implementation
    pub shifter: ShifterKind,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            geometry: PanelGeometry::default(),
            gamma: 2.2,
            bcm_unit_us: 1,
            pins: PanelPins::default(),
            link: LinkSettings::default(),
            shifter: ShifterKind::default(),
        }
    }
}

impl PanelConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(ConfigError::InvalidGamma);
        }
        if self.bcm_unit_us == 0 || self.bcm_unit_us > MAX_BCM_UNIT_US {
            return Err(ConfigError::InvalidValue);
        }

        let required = self.geometry.address_lines();
        let configured = self.pins.address.len();
        if configured < required {
            return Err(ConfigError::AddressLines {
                required,
                configured,
            });
        }

        let mut used: u32 = 0;
        let link = [self.link.tx_pin, self.link.rx_pin];
        for pin in self.pins.iter().map(|p| p.pin).chain(link) {
            if pin > MAX_GPIO {
                return Err(ConfigError::InvalidPin);
            }
            let bit = 1u32 << pin;
            if used & bit != 0 {
                return Err(ConfigError::DuplicatePin(pin));
            }
            used |= bit;
        }

        Ok(())
    }

    /// Receive buffer size for the configured framing
    pub fn receive_capacity(&self) -> usize {
        self.geometry.receive_capacity(self.link.framing)
    }

    /// Bytes allocated at startup: three handoff slots, the bit-planes
    /// and the receive buffer
    pub fn arena_bytes(&self) -> usize {
        3 * self.geometry.frame_bytes() + self.geometry.plane_bytes() + self.receive_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PanelConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.pins.data_base(), Some(0));
        assert!(config.pins.output_enable.inverted);
    }

    #[test]
    fn test_pin_level() {
        assert!(PinConfig::new(3).level(true));
        assert!(!PinConfig::inverted(8).level(true));
        assert!(PinConfig::inverted(8).level(false));
    }

    #[test]
    fn test_duplicate_pin_rejected() {
        let mut config = PanelConfig::default();
        config.pins.latch = PinConfig::new(6);
        assert_eq!(config.validate(), Err(ConfigError::DuplicatePin(6)));
    }

    #[test]
    fn test_missing_address_lines_rejected() {
        let mut config = PanelConfig::default();
        config.pins.address.pop();
        assert_eq!(
            config.validate(),
            Err(ConfigError::AddressLines {
                required: 4,
                configured: 3
            })
        );
    }

    #[test]
    fn test_scattered_data_pins_have_no_base() {
        let mut pins = PanelPins::default();
        pins.data.swap(1, 2);
        assert_eq!(pins.data_base(), None);
    }

    #[test]
    fn test_arena_covers_every_buffer() {
        let config = PanelConfig::default();
        let geometry = config.geometry;
        // 128x32: 8192-byte frames, 16 scan rows of 6 planes
        assert_eq!(geometry.plane_bytes(), 16 * 6 * 128);
        assert_eq!(
            config.arena_bytes(),
            3 * 8192 + 16 * 6 * 128 + config.receive_capacity()
        );
    }

    #[test]
    fn test_bad_gamma_rejected() {
        let mut config = PanelConfig::default();
        config.gamma = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidGamma));
    }

    #[test]
    fn test_bcm_unit_bounds() {
        let mut config = PanelConfig::default();
        config.bcm_unit_us = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidValue));

        config.bcm_unit_us = MAX_BCM_UNIT_US;
        assert_eq!(config.validate(), Ok(()));

        config.bcm_unit_us = MAX_BCM_UNIT_US + 1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidValue));

        config.bcm_unit_us = u32::MAX;
        assert_eq!(config.validate(), Err(ConfigError::InvalidValue));
    }
}

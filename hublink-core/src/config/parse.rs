//! Minimal parser for `panel.toml`
//!
//! Handles only the subset of TOML the panel configuration uses; tables of
//! tables, dates and multi-line strings are rejected.
//!
//! Supported features:
//! - `[section]` headers (`panel`, `pins`, `link`)
//! - Key = value pairs (string, integer, float)
//! - Single-line string arrays: `address = ["gpio9", "gpio10"]`
//! - Comments (# ...)

use core::str::FromStr;

use heapless::Vec;

use super::geometry::PanelGeometry;
use super::types::{ConfigError, FramingMode, PanelConfig, PinConfig, ShifterKind};

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Panel,
    Pins,
    Link,
}

/// Parse TOML configuration into a validated [`PanelConfig`]
///
/// Keys that are absent keep their [`PanelConfig::default`] value.
pub fn parse_config(input: &str) -> Result<PanelConfig, ConfigError> {
    let mut config = PanelConfig::default();
    let mut section = Section::Root;
    let mut width = config.geometry.width() as u16;
    let mut height = config.geometry.height() as u16;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
        match section {
            Section::Panel => match key {
                "width" => width = parse_int(value)?,
                "height" => height = parse_int(value)?,
                _ => apply_panel(&mut config, key, value)?,
            },
            Section::Pins => apply_pin(&mut config, key, value)?,
            Section::Link => apply_link(&mut config, key, value)?,
            Section::Root => return Err(ConfigError::UnknownKey),
        }
    }

    config.geometry = PanelGeometry::new(width, height)?;
    config.validate()?;
    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    match header.trim() {
        "panel" => Ok(Section::Panel),
        "pins" => Ok(Section::Pins),
        "link" => Ok(Section::Link),
        _ => Err(ConfigError::InvalidSection),
    }
}

fn apply_panel(config: &mut PanelConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "gamma" => config.gamma = parse_number(value)?,
        "bcm_unit_us" => config.bcm_unit_us = parse_int(value)?,
        "shifter" => config.shifter = parse_shifter(value)?,
        _ => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

fn apply_pin(config: &mut PanelConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let pins = &mut config.pins;
    match key {
        "r1" => pins.data[0] = parse_pin(value)?,
        "g1" => pins.data[1] = parse_pin(value)?,
        "b1" => pins.data[2] = parse_pin(value)?,
        "r2" => pins.data[3] = parse_pin(value)?,
        "g2" => pins.data[4] = parse_pin(value)?,
        "b2" => pins.data[5] = parse_pin(value)?,
        "clock" => pins.clock = parse_pin(value)?,
        "latch" => pins.latch = parse_pin(value)?,
        "output_enable" => pins.output_enable = parse_pin(value)?,
        "address" => pins.address = parse_pin_list(value)?,
        _ => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

fn apply_link(config: &mut PanelConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let link = &mut config.link;
    match key {
        "framing" => link.framing = parse_framing(value)?,
        "baudrate" => link.baudrate = parse_int(value)?,
        "tx_pin" => link.tx_pin = parse_pin(value)?.pin,
        "rx_pin" => link.rx_pin = parse_pin(value)?.pin,
        _ => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Strip an inline comment unless the '#' sits inside a string
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Remove surrounding quotes, if any
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an integer, allowing `_` digit separators (`115_200`)
fn parse_int<T: FromStr>(value: &str) -> Result<T, ConfigError> {
    let mut digits: heapless::String<16> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ConfigError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ConfigError::InvalidValue)
}

fn parse_number(value: &str) -> Result<f32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue)
}

/// Parse a pin string like "gpio11" or "!gpio8"
fn parse_pin(value: &str) -> Result<PinConfig, ConfigError> {
    let value = parse_string(value);
    let (inverted, name) = match value.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let number = name.strip_prefix("gpio").ok_or(ConfigError::InvalidPin)?;
    let pin: u8 = number.parse().map_err(|_| ConfigError::InvalidPin)?;

    Ok(PinConfig { pin, inverted })
}

/// Parse `["gpio9", "gpio10"]`
fn parse_pin_list<const N: usize>(value: &str) -> Result<Vec<PinConfig, N>, ConfigError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ConfigError::InvalidValue)?;

    let mut pins = Vec::new();
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        pins.push(parse_pin(item)?)
            .map_err(|_| ConfigError::TooManyItems)?;
    }
    Ok(pins)
}

fn parse_framing(value: &str) -> Result<FramingMode, ConfigError> {
    match parse_string(value) {
        "auto" => Ok(FramingMode::Auto),
        "stuffed" | "cobs" => Ok(FramingMode::Stuffed),
        "text" | "base64" => Ok(FramingMode::Text),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn parse_shifter(value: &str) -> Result<ShifterKind, ConfigError> {
    match parse_string(value) {
        "pio" => Ok(ShifterKind::Pio),
        "bitbang" | "gpio" => Ok(ShifterKind::BitBang),
        _ => Err(ConfigError::InvalidValue),
    }
}

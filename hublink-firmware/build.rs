//! Build script for hublink-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates panel.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const PIN_KEYS: [&str; 9] = [
    "r1",
    "g1",
    "b1",
    "r2",
    "g2",
    "b2",
    "clock",
    "latch",
    "output_enable",
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate panel.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=panel.toml");

    let config_path = Path::new("panel.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read panel.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in panel.toml",
            &e.to_string().lines().map(String::from).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_panel(&config, &mut errors);
    validate_pins(&config, &mut errors);
    validate_link(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid panel.toml", &errors);
    }

    println!("cargo:warning=panel.toml validated successfully");
}

/// Abort the build with a boxed error listing
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.clone()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

fn section<'a>(
    config: &'a toml::Value,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<&'a toml::value::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => {
            errors.push(format!("Missing [{}] section", name));
            None
        }
    }
}

fn validate_panel(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(panel) = section(config, "panel", errors) else {
        return;
    };

    let width = panel.get("width").and_then(toml::Value::as_integer);
    let height = panel.get("height").and_then(toml::Value::as_integer);

    match width {
        Some(w) if (1..=512).contains(&w) => {}
        Some(_) => errors.push("[panel] width must be 1-512".into()),
        None => errors.push("[panel] missing integer 'width'".into()),
    }
    match height {
        Some(h) if h > 0 && h % 2 == 0 && (h / 2).count_ones() == 1 && h / 2 <= 32 => {}
        Some(_) => errors.push("[panel] height must be 2x a power of two, at most 64".into()),
        None => errors.push("[panel] missing integer 'height'".into()),
    }

    if let Some(gamma) = panel.get("gamma") {
        let value = gamma
            .as_float()
            .or_else(|| gamma.as_integer().map(|g| g as f64));
        if !value.is_some_and(|g| g > 0.0) {
            errors.push("[panel] gamma must be a positive number".into());
        }
    }

    if let Some(unit) = panel.get("bcm_unit_us") {
        if !unit.as_integer().is_some_and(|u| (1..=1000).contains(&u)) {
            errors.push("[panel] bcm_unit_us must be 1-1000".into());
        }
    }

    if let Some(shifter) = panel.get("shifter") {
        if !matches!(shifter.as_str(), Some("pio" | "bitbang" | "gpio")) {
            errors.push("[panel] shifter must be 'pio' or 'bitbang'".into());
        }
    }
}

fn validate_pins(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(pins) = section(config, "pins", errors) else {
        return;
    };

    for key in PIN_KEYS {
        match pins.get(key).and_then(toml::Value::as_str) {
            Some(pin) => check_pin("pins", key, pin, errors),
            None => errors.push(format!("[pins] missing pin '{}'", key)),
        }
    }

    match pins.get("address").and_then(toml::Value::as_array) {
        Some(list) if !list.is_empty() && list.len() <= 5 => {
            for item in list {
                match item.as_str() {
                    Some(pin) => check_pin("pins", "address", pin, errors),
                    None => errors.push("[pins] address entries must be strings".into()),
                }
            }
        }
        Some(_) => errors.push("[pins] address must list 1-5 pins".into()),
        None => errors.push("[pins] missing 'address' list".into()),
    }
}

fn validate_link(config: &toml::Value, errors: &mut Vec<String>) {
    // The whole section is optional
    let Some(toml::Value::Table(link)) = config.get("link") else {
        return;
    };

    if let Some(framing) = link.get("framing") {
        if !matches!(
            framing.as_str(),
            Some("auto" | "stuffed" | "cobs" | "text" | "base64")
        ) {
            errors.push("[link] framing must be 'auto', 'stuffed' or 'text'".into());
        }
    }

    if let Some(baud) = link.get("baudrate") {
        if !baud.as_integer().is_some_and(|b| b > 0) {
            errors.push("[link] baudrate must be a positive integer".into());
        }
    }

    for key in ["tx_pin", "rx_pin"] {
        if let Some(pin) = link.get(key) {
            match pin.as_str() {
                Some(pin) => check_pin("link", key, pin, errors),
                None => errors.push(format!("[link] {} must be a pin string", key)),
            }
        }
    }
}

/// Check a `gpioN` / `!gpioN` pin string
fn check_pin(section: &str, key: &str, pin: &str, errors: &mut Vec<String>) {
    let name = pin.strip_prefix('!').unwrap_or(pin);
    let valid = name
        .strip_prefix("gpio")
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| n <= 29);
    if !valid {
        errors.push(format!("[{}] {} = \"{}\" is not gpio0-gpio29", section, key, pin));
    }
}

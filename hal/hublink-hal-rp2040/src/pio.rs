//! PIO pixel shift program
//!
//! Uses RP2040's Programmable I/O to clock packed pixels into the panel
//! chain. The CPU pushes one FIFO word per pixel; the state machine puts the
//! low six bits on the colour data pins and toggles the shift clock through
//! side-set, so the refresh core only waits on the FIFO.
//!
//! # Timing
//!
//! One pixel takes [`CYCLES_PER_PIXEL`] state machine cycles:
//!
//! ```text
//! pull block      side 0        ; 1 cycle, clock low
//! out pins, 6     side 0 [1]    ; 2 cycles, data settles
//! nop             side 1 [1]    ; 2 cycles, panel samples on the rising edge
//! ```
//!
//! The pixel rate is therefore `SYS_CLK / (divider * CYCLES_PER_PIXEL)`.

/// System clock frequency (RP2040 default)
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// State machine cycles spent on one pixel
pub const CYCLES_PER_PIXEL: u32 = 5;

/// Default panel shift clock; most HUB75 drivers are rated for 25 MHz or more
pub const DEFAULT_SHIFT_CLOCK_HZ: u32 = 12_500_000;

/// Fastest pixel rate the program can reach (divider of 1.0)
pub const MAX_SHIFT_CLOCK_HZ: u32 = SYS_CLK_HZ / CYCLES_PER_PIXEL;

/// Calculate the clock divider for a target pixel rate
///
/// divider = SYS_CLK / (freq * CYCLES_PER_PIXEL)
///
/// Returns (integer_part, fractional_part) for the 16.8 fixed-point divider.
/// Rates above [`MAX_SHIFT_CLOCK_HZ`] clamp to a divider of 1.0.
pub fn calc_clock_divider(shift_hz: u32) -> (u16, u8) {
    if shift_hz == 0 {
        return (0xFFFF, 0xFF);
    }

    let divisor = shift_hz as u64 * CYCLES_PER_PIXEL as u64;
    let divider_x256 = (SYS_CLK_HZ as u64 * 256) / divisor;

    // Below 1.0 the state machine cannot run faster
    let divider_x256 = divider_x256.clamp(256, 0xFFFF_FF);

    let int_part = (divider_x256 / 256) as u16;
    let frac_part = (divider_x256 % 256) as u8;

    (int_part, frac_part)
}

/// Divider as raw U24F8 bits, ready for `U24F8::from_bits`
pub fn divider_bits(shift_hz: u32) -> u32 {
    let (int_div, frac_div) = calc_clock_divider(shift_hz);
    ((int_div as u32) << 8) | (frac_div as u32)
}

/// Pixel rate actually produced for a requested rate
pub fn effective_shift_clock(shift_hz: u32) -> u32 {
    let bits = divider_bits(shift_hz) as u64;
    ((SYS_CLK_HZ as u64 * 256) / (bits * CYCLES_PER_PIXEL as u64)) as u32
}

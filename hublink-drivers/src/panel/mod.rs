//! GPIO panel drivers
//!
//! Generic over `embedded_hal::digital::OutputPin`, so the same code drives
//! RP2040 outputs on target and mock pins in tests.

pub mod control;
pub mod shifter;

pub use control::GpioPanelControl;
pub use shifter::BitBangShifter;

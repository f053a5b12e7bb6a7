//! Hardware driver implementations
//!
//! Concrete implementations of the panel-facing traits from `hublink-hal`
//! built on `embedded-hal` digital outputs:
//!
//! - Bit-banged pixel shifter (six data lines plus clock)
//! - GPIO panel control (row address, latch, output enable)
//!
//! The PIO-assisted shifter lives in the chip-specific HAL crate.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod panel;

pub use panel::{BitBangShifter, GpioPanelControl};

//! RP2040-specific HAL for the HUB75 panel firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `hublink-hal` traits, plus RP2040-specific functionality:
//!
//! - PIO-based pixel shifting (one FIFO word per pixel)
//! - PIO clock divider math
//! - Pin allocation by number for config-driven setup

#![no_std]

pub mod pins;
pub mod pio;
pub mod shifter;

pub use shifter::PioShifter;

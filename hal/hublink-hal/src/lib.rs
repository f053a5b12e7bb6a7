//! hublink Hardware Abstraction Layer
//!
//! This crate defines the capabilities the refresh loop needs from a HUB75
//! panel. Chip-specific crates (PIO on the RP2040) and generic
//! `embedded-hal` drivers implement them, so the scan logic can run on the
//! target or against a recording fake on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  hublink-core (ScanDriver, Refresher)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  hublink-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ hublink-hal-  │       │   hublink-    │
//! │ rp2040 (PIO)  │       │   drivers     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`shift::PixelShifter`] - Clocks packed pixel bytes into the panel chain
//! - [`panel::PanelControl`] - Row address, latch and output-enable gate

#![no_std]
#![deny(unsafe_code)]

pub mod panel;
pub mod shift;

// Re-export key traits at crate root for convenience
pub use panel::PanelControl;
pub use shift::{PixelShifter, SubPixel, PIXEL_MASK};

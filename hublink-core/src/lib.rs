//! Board-agnostic refresh pipeline for the LED matrix firmware
//!
//! This crate contains everything between the link bytes and the panel
//! electrical signals that does not depend on a specific chip:
//!
//! - Panel configuration, geometry and the `panel.toml` parser
//! - Gamma correction and the BCM bit-plane encoder
//! - The cross-core frame handoff
//! - The scan driver and the refresh-side composition around it
//! - The receive-side link session
//!
//! ```text
//!  link bytes ─► LinkSession ─► FrameHandoff ─► Refresher ─► ScanDriver ─► panel
//!                 (decoder)      (newest wins)   (BcmEncoder)
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bcm;
pub mod config;
pub mod frame;
pub mod gamma;
pub mod handoff;
pub mod refresh;
pub mod scan;
pub mod session;

pub use bcm::{BcmEncoder, BitPlaneSet};
pub use config::{PanelConfig, PanelGeometry, COLOR_DEPTH};
pub use frame::{Frame, FrameError};
pub use gamma::GammaTable;
pub use handoff::{FrameConsumer, FrameHandoff, FrameProducer, HandoffError};
pub use refresh::Refresher;
pub use scan::ScanDriver;
pub use session::{AckSink, LinkSession, SessionStats};

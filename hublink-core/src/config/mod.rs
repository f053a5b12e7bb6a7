//! Configuration types
//!
//! Panel geometry, wiring and link settings, loaded once at boot from the
//! `panel.toml` embedded in the firmware image.

pub mod geometry;
pub mod parse;
pub mod types;

pub use geometry::*;
pub use parse::parse_config;
pub use types::*;

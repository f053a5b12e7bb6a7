//! hublink Link Protocol
//!
//! This crate defines how a host streams RGB565 frames to the panel
//! controller over a serial link. One frame payload is always exactly
//! `width × height × 2` bytes (little-endian pixels); three framings carry it:
//!
//! ```text
//! Byte-stuffed:  ┌──────────────────────────────┬──────┐
//!                │ stuffed payload (no 0x00)    │ 0x00 │   no acknowledgment
//!                └──────────────────────────────┴──────┘
//! Text:          ┌──────────────────────────────┬──────┐
//!                │ 64-symbol text payload       │ '\n' │   'K' / 'E'
//!                └──────────────────────────────┴──────┘
//! Raw fast-path: ┌───────────┬──────────────────────────┐
//!                │ 0xFF 0x00 │ payload, counted         │   'K' / 'E'
//!                └───────────┴──────────────────────────┘
//! ```
//!
//! The receiver never allocates: partial records accumulate in a
//! caller-provided [`ReceiveBuffer`] and decoded payloads land in a
//! caller-provided destination slice.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod cobs;
pub mod decoder;
pub mod text;

pub use buffer::{BufferFull, ReceiveBuffer};
pub use decoder::{
    required_capacity, DecodeError, DecodeOutcome, FrameDecoder, FramingMode, Scheme,
};

/// Acknowledgment byte sent after an accepted text or raw frame
pub const ACK_OK: u8 = b'K';

/// Acknowledgment byte sent after a rejected text or raw frame
pub const ACK_ERROR: u8 = b'E';

/// Two-byte marker that switches the receiver into the raw fast-path
pub const RAW_SENTINEL: [u8; 2] = [0xFF, 0x00];

/// Terminates a byte-stuffed record
pub const STUFFED_TERMINATOR: u8 = 0x00;

/// Terminates a text record
pub const TEXT_TERMINATOR: u8 = b'\n';

/// Ignored inside text records
pub const TEXT_IGNORED: u8 = b'\r';

/// Slack added on top of the worst-case encoded frame size
pub const RECEIVE_MARGIN: usize = 200;

//! Cross-task and cross-core communication
//!
//! Defines the statics shared between the link tasks on core 0 and the
//! refresh loop on core 1. The refresh core only ever stores to atomics.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicU32;

use hublink_core::{AckSink, SessionStats};

/// Channel capacity for acknowledgment bytes
const ACK_CHANNEL_SIZE: usize = 16;

/// Acknowledgment bytes waiting to go out on the link
pub static ACK_CHANNEL: Channel<CriticalSectionRawMutex, u8, ACK_CHANNEL_SIZE> = Channel::new();

/// Latest receive statistics (updated by the link RX task)
pub static LINK_STATS: Signal<CriticalSectionRawMutex, SessionStats> = Signal::new();

/// Completed refresh cycles (updated by core 1)
pub static REFRESH_CYCLES: AtomicU32 = AtomicU32::new(0);

/// Frames encoded to bit-planes (updated by core 1)
pub static FRAMES_SHOWN: AtomicU32 = AtomicU32::new(0);

/// Queues acknowledgments on [`ACK_CHANNEL`]
pub struct ChannelAcks;

impl AckSink for ChannelAcks {
    fn send_ack(&mut self, byte: u8) {
        if ACK_CHANNEL.try_send(byte).is_err() {
            defmt::warn!("Ack channel full, dropping {}", byte as char);
        }
    }
}

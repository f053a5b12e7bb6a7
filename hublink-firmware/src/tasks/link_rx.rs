//! Link UART receive task
//!
//! Feeds received bytes through the link session, which decodes frames
//! straight into the handoff and queues acknowledgments.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use hublink_core::LinkSession;
use hublink_protocol::DecodeOutcome;

use crate::channels::{ChannelAcks, LINK_STATS};

/// Buffer size for one UART read
const RX_CHUNK_SIZE: usize = 256;

/// Link RX task - receives, decodes and publishes frames
#[embassy_executor::task]
pub async fn link_rx_task(
    mut rx: BufferedUartRx,
    mut session: LinkSession<'static, 'static, 'static>,
) {
    info!("Link RX task started");

    let mut buf = [0u8; RX_CHUNK_SIZE];
    let mut acks = ChannelAcks;

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                let mut input = &buf[..n];
                while !input.is_empty() {
                    let (used, outcome) = session.feed(input, &mut acks);
                    input = &input[used..];
                    match outcome {
                        Some(DecodeOutcome::Frame(scheme)) => trace!("Frame via {:?}", scheme),
                        Some(DecodeOutcome::Rejected(scheme, e)) => {
                            warn!("{:?} frame rejected: {:?}", scheme, e)
                        }
                        None => {}
                    }
                }
                LINK_STATS.signal(session.stats());
            }
            Ok(_) => {}
            Err(e) => {
                // Bytes were lost, so the record in progress cannot be trusted
                warn!("UART read error: {:?}", e);
                if let Some(DecodeOutcome::Rejected(scheme, err)) = session.reset(&mut acks) {
                    warn!("{:?} frame rejected: {:?}", scheme, err);
                }
                LINK_STATS.signal(session.stats());
            }
        }
    }
}

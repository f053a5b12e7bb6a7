//! Link UART transmit task
//!
//! Drains queued acknowledgment bytes onto the link.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::ACK_CHANNEL;

/// Acknowledgments written per UART call at most
const TX_BATCH_SIZE: usize = 8;

/// Link TX task - sends acknowledgment bytes
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    let mut batch = [0u8; TX_BATCH_SIZE];

    loop {
        batch[0] = ACK_CHANNEL.receive().await;
        let mut len = 1;
        while len < TX_BATCH_SIZE {
            match ACK_CHANNEL.try_receive() {
                Ok(byte) => {
                    batch[len] = byte;
                    len += 1;
                }
                Err(_) => break,
            }
        }

        if let Err(e) = tx.write_all(&batch[..len]).await {
            warn!("Failed to send acks: {:?}", e);
        }
    }
}

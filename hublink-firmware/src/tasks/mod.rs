//! Embassy async tasks
//!
//! All tasks run on core 0 and communicate via channels/signals. Core 1 is
//! reserved for the refresh loop.

pub mod link_rx;
pub mod link_tx;
pub mod tick;

pub use link_rx::link_rx_task;
pub use link_tx::link_tx_task;
pub use tick::tick_task;

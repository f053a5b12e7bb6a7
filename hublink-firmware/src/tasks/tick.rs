//! Periodic statistics
//!
//! Logs link and refresh counters so throughput can be watched over RTT.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;

use hublink_core::SessionStats;

use crate::channels::{FRAMES_SHOWN, LINK_STATS, REFRESH_CYCLES};

/// Statistics interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 5_000;

/// Tick task - logs a statistics line every interval
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let mut last = Instant::now();
    let mut last_cycles = REFRESH_CYCLES.load(Ordering::Relaxed);
    let mut stats = SessionStats::default();

    loop {
        ticker.next().await;

        if let Some(latest) = LINK_STATS.try_take() {
            stats = latest;
        }

        let elapsed_ms = last.elapsed().as_millis().max(1);
        last = Instant::now();
        let cycles = REFRESH_CYCLES.load(Ordering::Relaxed);
        let refresh_hz = u64::from(cycles.wrapping_sub(last_cycles)) * 1000 / elapsed_ms;
        last_cycles = cycles;

        info!(
            "frames ok={} failed={} overflows={} shown={} refresh={}Hz",
            stats.frames_ok,
            stats.frames_failed,
            stats.overflows,
            FRAMES_SHOWN.load(Ordering::Relaxed),
            refresh_hz
        );
    }
}

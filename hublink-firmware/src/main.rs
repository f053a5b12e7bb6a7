//! hublink - HUB75 LED matrix panel firmware
//!
//! Main firmware binary for RP2040 boards driving a HUB75 panel chain.
//! Core 0 runs the embassy executor with the link tasks; core 1 runs the
//! refresh loop without ever yielding.
//!
//! ```text
//!  core 0: UART ─► link_rx_task ─► LinkSession ──publish──┐
//!                  link_tx_task ◄─ ACK_CHANNEL            │
//!                                                  FrameHandoff
//!  core 1: Refresher ◄──────────────take_if_new───────────┘
//!            └─► BcmEncoder ─► ScanDriver ─► panel
//! ```

#![no_std]
#![no_main]

extern crate alloc;

use alloc::vec;
use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{PIO0, UART0};
use embassy_rp::pio::{Common, Pio};
use embassy_rp::uart::{Blocking, BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_rp::Peri;
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use portable_atomic::Ordering;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use hublink_core::config::{parse_config, LinkSettings};
use hublink_core::{
    BcmEncoder, BitPlaneSet, FrameHandoff, GammaTable, LinkSession, PanelConfig, Refresher,
    ScanDriver,
};
use hublink_hal_rp2040::pins::{uart0_pins_supported, PinBank, PinBankPeripherals};
use hublink_protocol::FrameDecoder;

use crate::channels::{FRAMES_SHOWN, REFRESH_CYCLES};
use crate::panel::{PanelControl, PanelShifter};

mod channels;
mod panel;
mod tasks;

// Heap allocator for the startup arena
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 160KB, enough for a 128x64 panel in text framing
const HEAP_SIZE: usize = 160 * 1024;

/// Stack for the refresh loop on core 1
const CORE1_STACK_SIZE: usize = 4096;

/// Embedded panel configuration (compiled into firmware)
/// Edit panel.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../panel.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

static HANDOFF: StaticCell<FrameHandoff<'static>> = StaticCell::new();
static PIO_COMMON: StaticCell<Common<'static, PIO0>> = StaticCell::new();
static CORE1_STACK: StaticCell<Stack<CORE1_STACK_SIZE>> = StaticCell::new();

type PanelRefresher = Refresher<'static, 'static, 'static, PanelShifter, PanelControl, Delay>;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("hublink firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    let geometry = config.geometry;
    info!(
        "Panel {}x{} ({} scan rows), framing {:?}, {} baud",
        geometry.width(),
        geometry.height(),
        geometry.scan_rows(),
        config.link.framing,
        config.link.baudrate
    );

    // Startup arena: every buffer is allocated once, here, and never freed
    let frame_bytes = geometry.frame_bytes();
    let slots = [
        vec![0u8; frame_bytes].leak(),
        vec![0u8; frame_bytes].leak(),
        vec![0u8; frame_bytes].leak(),
    ];
    let plane_storage = vec![0u8; geometry.plane_bytes()].leak();
    let receive_storage = vec![0u8; config.receive_capacity()].leak();
    info!("Allocated {} bytes of frame buffers", config.arena_bytes());

    let handoff = HANDOFF.init(unwrap!(FrameHandoff::new(slots)));
    let (producer, consumer) = handoff.split();

    // Claim concretely typed pins first, then bank the rest by number
    let (mut gpio, periph) = PinBankPeripherals::from_peripherals(p);

    let Some(uart) = link_uart(periph.uart0, &mut gpio, &config.link) else {
        defmt::panic!("Link pins unavailable");
    };
    let uart = uart.into_buffered(Irqs, TX_BUF.init([0u8; 64]), RX_BUF.init([0u8; 1024]));
    let (tx, rx) = uart.split();
    info!("UART initialized for the link");

    let Pio { common, sm0, .. } = Pio::new(periph.pio0, Irqs);
    let common = PIO_COMMON.init(common);
    let pio_shifter = panel::pio_shifter(&config, common, sm0, &mut gpio);

    let mut bank = PinBank::new(gpio);
    let shifter = match pio_shifter {
        Some(shifter) => shifter,
        None => unwrap!(panel::bitbang_shifter(&mut bank, &config.pins)),
    };
    let control = unwrap!(panel::panel_control(&mut bank, &config.pins));
    info!("Panel pins initialized");

    // Refresh side: encoder, bit-planes and scan driver all live on core 1
    let planes = unwrap!(BitPlaneSet::new(geometry, plane_storage));
    let driver = ScanDriver::new(shifter, control, Delay, config.bcm_unit_us);
    let encoder = BcmEncoder::new(GammaTable::new(config.gamma));
    let refresher = Refresher::new(consumer, encoder, planes, driver);

    spawn_core1(
        periph.core1,
        CORE1_STACK.init(Stack::new()),
        move || refresh_loop(refresher),
    );
    info!("Refresh loop started on core 1");

    // Receive side
    let decoder = FrameDecoder::new(config.link.framing, frame_bytes, receive_storage);
    let session = unwrap!(LinkSession::new(decoder, producer));

    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::link_rx_task(rx, session)).unwrap();
    spawner.spawn(tasks::link_tx_task(tx)).unwrap();

    info!("All tasks spawned");
}

/// Core 1 body: refresh forever, publishing counters for the tick task
fn refresh_loop(mut refresher: PanelRefresher) -> ! {
    let mut cycles: u32 = 0;
    loop {
        refresher.cycle();
        cycles = cycles.wrapping_add(1);
        REFRESH_CYCLES.store(cycles, Ordering::Relaxed);
        FRAMES_SHOWN.store(refresher.frames_taken(), Ordering::Relaxed);
    }
}

/// Parse the embedded panel.toml, falling back to the default 128x32 panel
fn load_config() -> PanelConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("panel.toml rejected: {:?}, using defaults", e);
            return PanelConfig::default();
        }
    };

    if !uart0_pins_supported(&config.link) {
        error!(
            "gpio{}/gpio{} is not a UART0 pin pair, using defaults",
            config.link.tx_pin, config.link.rx_pin
        );
        return PanelConfig::default();
    }

    if config.arena_bytes() > HEAP_SIZE {
        error!(
            "Panel needs {} bytes of buffers, heap has {}, using defaults",
            config.arena_bytes(),
            HEAP_SIZE
        );
        return PanelConfig::default();
    }

    info!("Configuration loaded");
    config
}

/// Open UART0 on the configured pin pair
fn link_uart(
    uart: Peri<'static, UART0>,
    gpio: &mut PinBankPeripherals,
    link: &LinkSettings,
) -> Option<Uart<'static, Blocking>> {
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = link.baudrate;

    let uart = match (link.tx_pin, link.rx_pin) {
        (0, 1) => Uart::new_blocking(uart, gpio.pin0.take()?, gpio.pin1.take()?, uart_config),
        (12, 13) => Uart::new_blocking(uart, gpio.pin12.take()?, gpio.pin13.take()?, uart_config),
        (16, 17) => Uart::new_blocking(uart, gpio.pin16.take()?, gpio.pin17.take()?, uart_config),
        (28, 29) => Uart::new_blocking(uart, gpio.pin28.take()?, gpio.pin29.take()?, uart_config),
        _ => return None,
    };
    Some(uart)
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

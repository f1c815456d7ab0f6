//! MuxSense Firmware: Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  I2cDriver+FreeRtos   LogEventSink   FaultLog   MemConfig    │
//! │  (Bus)                (Event+Display)(FaultSink)(ConfigPort) │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            SensorService (pure logic)                  │  │
//! │  │  discovery (once) · scan (periodic) · status           │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use muxsense::adapters::config_store::MemConfigStore;
use muxsense::adapters::fault_log::FaultLog;
use muxsense::adapters::log_sink::{LogDisplay, LogEventSink};
use muxsense::app::ports::ConfigPort;
use muxsense::app::service::SensorService;
use muxsense::bus::Bus;
use muxsense::config::SensorBusConfig;

/// Main loop granularity.
const IDLE_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("MuxSense v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let store = MemConfigStore::new();
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("config load failed ({e}), using defaults");
            SensorBusConfig::default()
        }
    };

    // ── 3. Bus ────────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let i2c_config = I2cConfig::new().baudrate(Hertz(config.i2c_frequency_hz));
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &i2c_config,
    )?;
    let bus = Bus::new(i2c, FreeRtos);

    // ── 4. Discovery (once) ───────────────────────────────────
    let scan_every = Duration::from_millis(u64::from(config.scan_interval_ms));
    let show_every = Duration::from_millis(u64::from(config.display_interval_ms));

    let mut service = SensorService::new(bus, config);
    let mut faults = FaultLog::new();
    let mut events = LogEventSink::new();
    let mut display = LogDisplay;

    service.discover(&mut faults, &mut events);

    // ── 5. Scan + status loop ─────────────────────────────────
    let mut next_scan = Instant::now();
    let mut next_show = Instant::now();
    loop {
        let now = Instant::now();
        if now >= next_scan {
            if let Err(e) = service.scan(&mut faults, &mut events) {
                warn!("scan skipped: {e}");
            }
            next_scan = now + scan_every;
        }
        if now >= next_show {
            service.show_next(&mut display);
            next_show = now + show_every;
        }
        FreeRtos::delay_ms(IDLE_MS);
    }
}

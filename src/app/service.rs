//! Sensor service: the hexagonal core.
//!
//! [`SensorService`] owns the bus, the configuration and, once discovery
//! has run, the [`Topology`]. Fault reporting, events and the status
//! display are injected at call sites through port traits.
//!
//! ```text
//!                 ┌────────────────────────┐ ──▶ EventSink
//!    Bus<I2C> ◀──▶│     SensorService      │ ──▶ FaultSink
//!                 │ discover · scan · show │ ──▶ DisplaySink
//!                 └────────────────────────┘
//! ```
//!
//! Discovery runs once. Scans borrow the service mutably, so two scans
//! can never overlap and no scan can start before discovery finished.

use std::time::Instant;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::bus::Bus;
use crate::config::SensorBusConfig;
use crate::discovery;
use crate::error::{Error, Result};
use crate::scan::{self, ScanReport};
use crate::status::{self, StatusCursor};
use crate::topology::Topology;

use super::events::AppEvent;
use super::ports::{DisplaySink, EventSink, FaultSink};

// ───────────────────────────────────────────────────────────────
// SensorService
// ───────────────────────────────────────────────────────────────

pub struct SensorService<I2C, D> {
    bus: Bus<I2C, D>,
    config: SensorBusConfig,
    topology: Option<Topology>,
    cursor: StatusCursor,
    cycles: u32,
    last_report: ScanReport,
}

impl<I2C, D> SensorService<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(bus: Bus<I2C, D>, config: SensorBusConfig) -> Self {
        Self {
            bus,
            config,
            topology: None,
            cursor: StatusCursor::default(),
            cycles: 0,
            last_report: ScanReport::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the discovery pass and fix the topology.
    ///
    /// A second call leaves the existing topology untouched.
    pub fn discover(
        &mut self,
        faults: &mut impl FaultSink,
        sink: &mut impl EventSink,
    ) -> &Topology {
        if self.topology.is_some() {
            warn!("discovery already ran; topology is fixed");
        } else {
            sink.emit(&AppEvent::DiscoveryStarted);
            let started = Instant::now();
            let topology = discovery::discover(&mut self.bus, faults, &self.config);
            let elapsed_ms = started.elapsed().as_millis() as u32;
            info!("discovery time: {elapsed_ms} ms");

            let mut summary = topology.summary();
            summary.elapsed_ms = elapsed_ms;
            sink.emit(&AppEvent::DiscoveryComplete(summary));
            self.topology = Some(topology);
        }
        self.topology.get_or_insert_with(Topology::new)
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one scan cycle over the discovered topology.
    pub fn scan(
        &mut self,
        faults: &mut impl FaultSink,
        sink: &mut impl EventSink,
    ) -> Result<ScanReport> {
        let topology = self.topology.as_mut().ok_or(Error::NotReady)?;
        let report = scan::scan(
            topology,
            &mut self.bus,
            faults,
            self.config.auto_clear_faults,
        );
        self.cycles = self.cycles.wrapping_add(1);
        self.last_report = report;
        sink.emit(&AppEvent::ScanComplete {
            cycle: self.cycles,
            report,
        });
        Ok(report)
    }

    /// Show the next sensor's last reading and advance the cursor.
    pub fn show_next(&mut self, display: &mut impl DisplaySink) {
        let empty = Topology::new();
        let topology = self.topology.as_ref().unwrap_or(&empty);
        let (next, line) = status::step(self.cursor, topology);
        display.show(&line);
        self.cursor = next;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn is_discovered(&self) -> bool {
        self.topology.is_some()
    }

    pub fn config(&self) -> &SensorBusConfig {
        &self.config
    }

    /// Completed scan cycles.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn last_report(&self) -> ScanReport {
        self.last_report
    }

    pub fn bus_mut(&mut self) -> &mut Bus<I2C, D> {
        &mut self.bus
    }

    pub fn release(self) -> Bus<I2C, D> {
        self.bus
    }
}

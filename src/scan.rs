//! Scan engine: refresh every discovered sensor once per cycle.
//!
//! Only populated entries are visited; the topology is gapless so there
//! is nothing to skip. The port pass stops at the first multiplexer
//! without port sensors, so sensors discovered behind a later multiplexer
//! are never polled. The mounted pass visits every multiplexer.
//!
//! A failed read updates that sensor's reading record and is reported at
//! most once per fault kind per episode. Nothing is retried within a
//! cycle.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;
use serde::Serialize;

use crate::addresses::MOUNTED_PORT;
use crate::app::ports::FaultSink;
use crate::bus::Bus;
use crate::discovery::isolate;
use crate::error::FaultKind;
use crate::topology::{Multiplexer, PortDevice, SlotId, Topology};

/// Fault kinds the scan engine raises, and therefore may clear.
pub const SCAN_FAULTS: [FaultKind; 5] = [
    FaultKind::ExtSensorRead,
    FaultKind::MuxRouting,
    FaultKind::MountedTmp275Read,
    FaultKind::MountedHdc1080Read,
    FaultKind::MountedMs8607Read,
];

/// Per-cycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub port_reads: u16,
    pub port_failures: u16,
    pub mounted_reads: u16,
    pub mounted_failures: u16,
    pub routing_failures: u16,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.port_failures == 0 && self.mounted_failures == 0 && self.routing_failures == 0
    }
}

/// Failure kinds seen this cycle, plus the reporter they go to.
struct CycleFaults<'a, F: ?Sized> {
    sink: &'a mut F,
    seen: u16,
    /// Kinds whose reads were skipped, so this cycle proves nothing about them.
    skipped: u16,
}

impl<F: FaultSink + ?Sized> CycleFaults<'_, F> {
    fn note(&mut self, kind: FaultKind, detail: core::fmt::Arguments<'_>) {
        self.seen |= kind.mask();
        if !self.sink.is_active(kind) {
            self.sink.raise(kind, detail);
        }
    }

    fn skip(&mut self, kind: FaultKind) {
        self.skipped |= kind.mask();
    }

    fn recovered(&self, kind: FaultKind) -> bool {
        (self.seen | self.skipped) & kind.mask() == 0
    }
}

/// Run one scan cycle.
///
/// With `auto_clear`, any scan fault kind that is active but did not recur
/// during this cycle is cleared, ending its episode. A kind whose reads
/// were skipped by a routing failure stays active.
pub fn scan<I2C, D, F>(
    topology: &mut Topology,
    bus: &mut Bus<I2C, D>,
    faults: &mut F,
    auto_clear: bool,
) -> ScanReport
where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let mut report = ScanReport::default();
    let mut cycle = CycleFaults {
        sink: faults,
        seen: 0,
        skipped: 0,
    };

    for mux in &mut topology.muxes {
        if !mux.has_sensors() {
            break;
        }
        scan_ports(mux, bus, &mut cycle, &mut report);
    }

    for mux in &mut topology.muxes {
        scan_mounted(mux, bus, &mut cycle, &mut report);
    }

    if auto_clear {
        for kind in SCAN_FAULTS {
            if cycle.recovered(kind) && cycle.sink.is_active(kind) {
                cycle.sink.clear(kind);
                info!("fault cleared: {kind}");
            }
        }
    }

    report
}

fn scan_ports<I2C, D, F>(
    mux: &mut Multiplexer,
    bus: &mut Bus<I2C, D>,
    cycle: &mut CycleFaults<'_, F>,
    report: &mut ScanReport,
) where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let m = mux.index();
    for (p, port) in mux.ports.iter_mut().enumerate() {
        if let Err(e) = mux.driver.select(bus, p as u8) {
            report.routing_failures += 1;
            cycle.note(
                FaultKind::MuxRouting,
                format_args!("mux[{m}].port[{p}] select: {e}"),
            );
            // Routing is unknown; the rest of this mux waits for next cycle.
            cycle.skip(FaultKind::ExtSensorRead);
            break;
        }

        for (s, sensor) in port.slots.iter_mut().enumerate() {
            let result = match &sensor.device {
                PortDevice::Tmp275(dev) => dev.read(bus),
            };
            if sensor.reading.record(result) {
                report.port_reads += 1;
            } else {
                report.port_failures += 1;
                let id = SlotId::new(m, p as u8, s as u8);
                cycle.note(FaultKind::ExtSensorRead, format_args!("{id}"));
            }
        }
    }
    isolate(mux, bus);
}

fn scan_mounted<I2C, D, F>(
    mux: &mut Multiplexer,
    bus: &mut Bus<I2C, D>,
    cycle: &mut CycleFaults<'_, F>,
    report: &mut ScanReport,
) where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let m = mux.index();
    if let Err(e) = mux.driver.select(bus, MOUNTED_PORT) {
        report.routing_failures += 1;
        cycle.note(
            FaultKind::MuxRouting,
            format_args!("mux[{m}] mounted port select: {e}"),
        );
        cycle.skip(FaultKind::MountedTmp275Read);
        cycle.skip(FaultKind::MountedHdc1080Read);
        cycle.skip(FaultKind::MountedMs8607Read);
        isolate(mux, bus);
        return;
    }

    if let Some(tmp) = mux.tmp275.as_mut() {
        let result = tmp.device.read(bus);
        if tmp.reading.record(result) {
            report.mounted_reads += 1;
        } else {
            report.mounted_failures += 1;
            cycle.note(FaultKind::MountedTmp275Read, format_args!("mux[{m}] TMP275"));
        }
    }

    if let Some(hdc) = mux.hdc1080.as_mut() {
        let result = hdc.device.read(bus);
        if hdc.reading.record(result) {
            report.mounted_reads += 1;
        } else {
            report.mounted_failures += 1;
            cycle.note(FaultKind::MountedHdc1080Read, format_args!("mux[{m}] HDC1080"));
        }
    }

    if let Some(ms) = mux.ms8607.as_mut() {
        let result = ms.device.read(bus);
        if ms.reading.record(result) {
            report.mounted_reads += 1;
        } else {
            report.mounted_failures += 1;
            cycle.note(FaultKind::MountedMs8607Read, format_args!("mux[{m}] MS8607"));
        }
    }

    isolate(mux, bus);
}


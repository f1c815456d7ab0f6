//! In-memory model of the external sensor network.
//!
//! ```text
//! Topology
//!  └─ muxes: [Multiplexer; ≤ MAX_MUXES]
//!      ├─ installed capabilities + mounted device handles (port 7)
//!      └─ ports: [Port; ≤ MAX_PORTS]
//!          └─ slots: [PortSensor; ≤ MAX_SENSORS]
//! ```
//!
//! Every level is a fixed-capacity `heapless::Vec` that only grows at its
//! end, so occupancy is gapless by construction: an element at index `i`
//! implies elements at `0..i`. "Exists" and "has sensors" are therefore
//! answered by length, not by flags that could disagree.
//!
//! The model is built exclusively by [`discovery`](crate::discovery).
//! After that only reading records change, and only through
//! [`scan`](crate::scan).

use core::fmt;

use heapless::Vec;
use serde::Serialize;

use crate::addresses::{MAX_MUXES, MAX_PORTS, MAX_SENSORS};
use crate::drivers::hdc1080::Hdc1080;
use crate::drivers::ms8607::Ms8607;
use crate::drivers::pca9548a::Pca9548a;
use crate::drivers::tmp275::Tmp275;
use crate::identity::AssemblyIdentity;
use crate::readings::{Barometric, Climate, SensorReading, Temperature};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Which mux-mounted sensors are confirmed present and initialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const TMP275: Self = Self(1 << 0);
    /// Shares address 0x40 with HDC1080; the two are mutually exclusive.
    pub const MS8607: Self = Self(1 << 1);
    pub const HDC1080: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl core::ops::BitOr for Capabilities {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl core::ops::BitAnd for Capabilities {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut sep = "";
        for (cap, name) in [
            (Self::TMP275, "TMP275"),
            (Self::MS8607, "MS8607"),
            (Self::HDC1080, "HDC1080"),
        ] {
            if self.contains(cap) {
                write!(f, "{sep}{name}")?;
                sep = "|";
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// (mux, port, slot) coordinates of a port sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub mux: u8,
    pub port: u8,
    pub slot: u8,
}

impl SlotId {
    pub const fn new(mux: u8, port: u8, slot: u8) -> Self {
        Self { mux, port, slot }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mux[{}].port[{}].sensor[{}]",
            self.mux, self.port, self.slot
        )
    }
}

// ---------------------------------------------------------------------------
// Port sensors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// TMP275 temperature-only sensor board.
    Tmp275,
}

/// Live driver for a port sensor. Add kinds by extending the enum.
#[derive(Debug)]
pub enum PortDevice {
    Tmp275(Tmp275),
}

#[derive(Debug)]
pub struct PortSensor {
    address: u8,
    pub(crate) device: PortDevice,
    pub(crate) reading: SensorReading<Temperature>,
}

impl PortSensor {
    pub(crate) fn tmp275(device: Tmp275) -> Self {
        Self {
            address: device.address(),
            device: PortDevice::Tmp275(device),
            reading: SensorReading::new(),
        }
    }

    /// Bus address, derived from the slot index at discovery.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn kind(&self) -> SensorKind {
        match self.device {
            PortDevice::Tmp275(_) => SensorKind::Tmp275,
        }
    }

    pub fn reading(&self) -> &SensorReading<Temperature> {
        &self.reading
    }
}

#[derive(Debug, Default)]
pub struct Port {
    pub(crate) slots: Vec<PortSensor, MAX_SENSORS>,
}

impl Port {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// True once slot 0 is populated.
    pub fn has_sensors(&self) -> bool {
        !self.slots.is_empty()
    }

    pub fn slot(&self, s: usize) -> Option<&PortSensor> {
        self.slots.get(s)
    }

    pub fn slots(&self) -> &[PortSensor] {
        &self.slots
    }
}

// ---------------------------------------------------------------------------
// Mux-mounted devices
// ---------------------------------------------------------------------------

/// A mounted device handle together with its reading record.
#[derive(Debug)]
pub struct Mounted<D, T> {
    pub(crate) device: D,
    pub(crate) reading: SensorReading<T>,
}

impl<D, T> Mounted<D, T> {
    fn new(device: D) -> Self {
        Self {
            device,
            reading: SensorReading::new(),
        }
    }

    pub fn reading(&self) -> &SensorReading<T> {
        &self.reading
    }
}

// ---------------------------------------------------------------------------
// Multiplexer
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Multiplexer {
    index: u8,
    pub(crate) driver: Pca9548a,
    installed: Capabilities,
    pub(crate) tmp275: Option<Mounted<Tmp275, Temperature>>,
    pub(crate) hdc1080: Option<Mounted<Hdc1080, Climate>>,
    pub(crate) ms8607: Option<Mounted<Ms8607, Barometric>>,
    assembly: Option<AssemblyIdentity>,
    pub(crate) ports: Vec<Port, MAX_PORTS>,
}

impl Multiplexer {
    pub(crate) fn new(index: u8, driver: Pca9548a) -> Self {
        Self {
            index,
            driver,
            installed: Capabilities::empty(),
            tmp275: None,
            hdc1080: None,
            ms8607: None,
            assembly: None,
            ports: Vec::new(),
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn address(&self) -> u8 {
        self.driver.address()
    }

    /// True once at least one port carries a sensor.
    pub fn has_sensors(&self) -> bool {
        !self.ports.is_empty()
    }

    pub fn installed_capabilities(&self) -> Capabilities {
        self.installed
    }

    pub fn assembly(&self) -> Option<&AssemblyIdentity> {
        self.assembly.as_ref()
    }

    pub fn port(&self, p: usize) -> Option<&Port> {
        self.ports.get(p)
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn mounted_tmp275(&self) -> Option<&SensorReading<Temperature>> {
        self.tmp275.as_ref().map(Mounted::reading)
    }

    pub fn mounted_hdc1080(&self) -> Option<&SensorReading<Climate>> {
        self.hdc1080.as_ref().map(Mounted::reading)
    }

    pub fn mounted_ms8607(&self) -> Option<&SensorReading<Barometric>> {
        self.ms8607.as_ref().map(Mounted::reading)
    }

    pub(crate) fn set_assembly(&mut self, assembly: AssemblyIdentity) {
        self.assembly = Some(assembly);
    }

    pub(crate) fn install_tmp275(&mut self, device: Tmp275) {
        self.tmp275 = Some(Mounted::new(device));
        self.installed.insert(Capabilities::TMP275);
    }

    pub(crate) fn install_hdc1080(&mut self, device: Hdc1080) {
        self.hdc1080 = Some(Mounted::new(device));
        self.installed.insert(Capabilities::HDC1080);
    }

    pub(crate) fn install_ms8607(&mut self, device: Ms8607) {
        self.ms8607 = Some(Mounted::new(device));
        self.installed.insert(Capabilities::MS8607);
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Topology {
    pub(crate) muxes: Vec<Multiplexer, MAX_MUXES>,
}

impl Topology {
    pub const fn new() -> Self {
        Self { muxes: Vec::new() }
    }

    pub fn mux(&self, m: usize) -> Option<&Multiplexer> {
        self.muxes.get(m)
    }

    pub fn muxes(&self) -> &[Multiplexer] {
        &self.muxes
    }

    pub fn mux_exists(&self, m: usize) -> bool {
        m < self.muxes.len()
    }

    pub fn port_sensor(&self, id: SlotId) -> Option<&PortSensor> {
        self.mux(id.mux as usize)?
            .port(id.port as usize)?
            .slot(id.slot as usize)
    }

    /// Reading record of the port sensor at `(m, p, s)`, if one was discovered.
    pub fn port_reading(&self, m: usize, p: usize, s: usize) -> Option<&SensorReading<Temperature>> {
        self.mux(m)?.port(p)?.slot(s).map(PortSensor::reading)
    }

    pub fn mounted_tmp275(&self, m: usize) -> Option<&SensorReading<Temperature>> {
        self.mux(m)?.mounted_tmp275()
    }

    pub fn mounted_hdc1080(&self, m: usize) -> Option<&SensorReading<Climate>> {
        self.mux(m)?.mounted_hdc1080()
    }

    pub fn mounted_ms8607(&self, m: usize) -> Option<&SensorReading<Barometric>> {
        self.mux(m)?.mounted_ms8607()
    }

    pub fn port_sensor_count(&self) -> usize {
        self.muxes
            .iter()
            .flat_map(|mux| mux.ports.iter())
            .map(|port| port.slots.len())
            .sum()
    }

    /// Every port sensor location, in gapless traversal order.
    pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.muxes.iter().flat_map(|mux| {
            mux.ports.iter().enumerate().flat_map(move |(p, port)| {
                (0..port.slots.len()).map(move |s| SlotId::new(mux.index, p as u8, s as u8))
            })
        })
    }

    pub fn summary(&self) -> TopologySummary {
        let mut mounted = Vec::new();
        for mux in &self.muxes {
            // Capacity equals MAX_MUXES; cannot overflow.
            let _ = mounted.push(mux.installed);
        }
        TopologySummary {
            muxes: self.muxes.len() as u8,
            ports: self.muxes.iter().map(|m| m.ports.len() as u8).sum(),
            port_sensors: self.port_sensor_count() as u8,
            mounted,
            elapsed_ms: 0,
        }
    }
}

/// Compact description of a discovered topology, for events and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologySummary {
    pub muxes: u8,
    pub ports: u8,
    pub port_sensors: u8,
    pub mounted: Vec<Capabilities, MAX_MUXES>,
    pub elapsed_ms: u32,
}

//! Discovery engine: one forward pass that builds the [`Topology`].
//!
//! Pass 1 walks multiplexers, ports and slots in index order and stops
//! each loop at the first absent index. Pass 2 visits the mounted port of
//! every multiplexer found, decodes its identification memory and brings
//! up the mounted sensors it names.
//!
//! Absence and init failure are the same thing here: the index is never
//! populated. Nothing in this module aborts the whole pass.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::addresses::{
    self, MAX_MUXES, MAX_PORTS, MAX_SENSORS, MOUNTED_HUMIDITY, MOUNTED_ID, MOUNTED_MS8607_PT,
    MOUNTED_PORT, MOUNTED_TMP275,
};
use crate::app::ports::FaultSink;
use crate::bus::Bus;
use crate::config::SensorBusConfig;
use crate::drivers::hdc1080::Hdc1080;
use crate::drivers::m24c32::M24c32;
use crate::drivers::ms8607::Ms8607;
use crate::drivers::pca9548a::Pca9548a;
use crate::drivers::tmp275::Tmp275;
use crate::error::FaultKind;
use crate::identity::{self, SENSOR1_PAGE, SENSOR2_PAGE};
use crate::topology::{Capabilities, Multiplexer, Port, PortSensor, Topology};

/// Probe and provision the whole network.
pub fn discover<I2C, D, F>(bus: &mut Bus<I2C, D>, faults: &mut F, config: &SensorBusConfig) -> Topology
where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let mut topology = Topology::new();

    for m in 0..MAX_MUXES {
        let address = addresses::mux_address(m);
        if !bus.probe(address).is_present() {
            info!("mux[{m}] (0x{address:02X}) not found");
            break;
        }
        let driver = match Pca9548a::init(bus, address) {
            Ok(d) => d,
            Err(e) => {
                info!("mux[{m}] (0x{address:02X}) init failed: {e}");
                break;
            }
        };
        info!("mux[{m}] found at 0x{address:02X}");

        let mut mux = Multiplexer::new(m as u8, driver);
        discover_ports(&mut mux, bus, config);
        isolate(&mut mux, bus);

        // Capacity equals MAX_MUXES.
        let _ = topology.muxes.push(mux);
    }

    for mux in &mut topology.muxes {
        discover_mounted(mux, bus, faults);
        isolate(mux, bus);
    }

    info!(
        "discovery: {} mux(es), {} port sensor(s)",
        topology.muxes.len(),
        topology.port_sensor_count()
    );
    topology
}

fn discover_ports<I2C: I2c, D: DelayNs>(
    mux: &mut Multiplexer,
    bus: &mut Bus<I2C, D>,
    config: &SensorBusConfig,
) {
    let m = mux.index();
    for p in 0..MAX_PORTS {
        // Probe whatever the routing left connected.
        if let Err(e) = mux.driver.select(bus, p as u8) {
            warn!("mux[{m}].port[{p}] select failed: {e}");
        }

        let mut port = Port::new();
        for s in 0..MAX_SENSORS {
            if config.probe_slot_id_memory {
                let id = addresses::slot_id_address(s);
                if bus.probe(id).is_present() {
                    debug!("mux[{m}].port[{p}].sensor[{s}] id memory at 0x{id:02X}");
                }
            }

            let address = addresses::slot_sensor_address(s);
            if !bus.probe(address).is_present() {
                break;
            }
            match Tmp275::init(bus, address) {
                Ok(dev) => {
                    info!("mux[{m}].port[{p}].sensor[{s}] TMP275 at 0x{address:02X}");
                    let _ = port.slots.push(PortSensor::tmp275(dev));
                }
                Err(e) => {
                    info!("mux[{m}].port[{p}].sensor[{s}] init failed: {e}");
                    break;
                }
            }
        }

        if !port.has_sensors() {
            debug!("mux[{m}].port[{p}] empty");
            break;
        }
        let _ = mux.ports.push(port);
    }
}

fn discover_mounted<I2C, D, F>(mux: &mut Multiplexer, bus: &mut Bus<I2C, D>, faults: &mut F)
where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let m = mux.index();
    if let Err(e) = mux.driver.select(bus, MOUNTED_PORT) {
        faults.raise(
            FaultKind::MuxRouting,
            format_args!("mux[{m}] mounted port select: {e}"),
        );
        return;
    }

    let mut requested = read_requested_capabilities(mux, bus, faults);
    if requested.is_empty() {
        info!("mux[{m}] no mounted sensors configured");
        return;
    }

    let humidity_acks = bus.probe(MOUNTED_HUMIDITY).is_present();
    let pt_acks = bus.probe(MOUNTED_MS8607_PT).is_present();

    if requested.contains(Capabilities::HDC1080) && requested.contains(Capabilities::MS8607) {
        faults.raise(
            FaultKind::CapabilityConflict,
            format_args!("mux[{m}] id memory names HDC1080 and MS8607"),
        );
        // Only an MS8607 answers at the pressure address.
        requested.remove(if pt_acks {
            Capabilities::HDC1080
        } else {
            Capabilities::MS8607
        });
    }

    if requested.contains(Capabilities::TMP275) {
        install_tmp275(mux, bus, faults);
    }
    if requested.contains(Capabilities::HDC1080) {
        install_hdc1080(mux, bus, faults, humidity_acks, pt_acks);
    }
    if requested.contains(Capabilities::MS8607) {
        install_ms8607(mux, bus, faults, humidity_acks, pt_acks);
    }

    info!(
        "mux[{m}] mounted sensors: {}",
        mux.installed_capabilities()
    );
}

/// Decode the mounted identification memory into the capabilities it names.
/// Any failure yields the capabilities decoded so far.
fn read_requested_capabilities<I2C, D, F>(
    mux: &mut Multiplexer,
    bus: &mut Bus<I2C, D>,
    faults: &mut F,
) -> Capabilities
where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let m = mux.index();
    let mut caps = Capabilities::empty();

    if !bus.probe(MOUNTED_ID).is_present() {
        info!("mux[{m}] no identification memory");
        return caps;
    }
    let memory = M24c32::new(MOUNTED_ID);

    let page = match memory.read_page(bus, identity::ASSEMBLY_PAGE) {
        Ok(page) => page,
        Err(e) => {
            faults.raise(FaultKind::IdMemoryRead, format_args!("mux[{m}] assembly page: {e}"));
            return caps;
        }
    };
    if identity::is_uninitialized(&page) {
        faults.raise(
            FaultKind::IdMemoryUninitialized,
            format_args!("mux[{m}] id memory byte 0 = 0x{:02X}", page[0]),
        );
        return caps;
    }
    match identity::decode_assembly(&page) {
        Ok(assembly) => {
            info!(
                "mux[{m}] assembly {} rev {}",
                assembly.name, assembly.revision
            );
            mux.set_assembly(assembly);
        }
        // The sensor records are independent of the assembly record.
        Err(e) => {
            faults.raise(FaultKind::IdMemoryDecode, format_args!("mux[{m}] assembly: {e}"));
        }
    }

    // No sensor 2 without sensor 1.
    for (n, page_no) in [SENSOR1_PAGE, SENSOR2_PAGE].into_iter().enumerate() {
        let page = match memory.read_page(bus, page_no) {
            Ok(page) => page,
            Err(e) => {
                faults.raise(
                    FaultKind::IdMemoryRead,
                    format_args!("mux[{m}] sensor {} page: {e}", n + 1),
                );
                break;
            }
        };
        let record = match identity::decode_sensor(&page) {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e) => {
                faults.raise(
                    FaultKind::IdMemoryDecode,
                    format_args!("mux[{m}] sensor {}: {e}", n + 1),
                );
                break;
            }
        };
        let kind = match record.sensor_type() {
            Ok(kind) => kind,
            Err(e) => {
                faults.raise(
                    FaultKind::IdMemoryDecode,
                    format_args!("mux[{m}] sensor {} '{}': {e}", n + 1, record.name),
                );
                break;
            }
        };

        let stored = record.address.resolve(m as usize);
        if stored != kind.mounted_address() {
            debug!(
                "mux[{m}] {} record address 0x{stored:02X}, using 0x{:02X}",
                kind.name(),
                kind.mounted_address()
            );
        }
        caps.insert(kind.capability());
    }

    caps
}

fn install_tmp275<I2C, D, F>(mux: &mut Multiplexer, bus: &mut Bus<I2C, D>, faults: &mut F)
where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let m = mux.index();
    if !bus.probe(MOUNTED_TMP275).is_present() {
        faults.raise(FaultKind::MountedSensorAbsent, format_args!("mux[{m}] TMP275 absent"));
        return;
    }
    match Tmp275::init(bus, MOUNTED_TMP275) {
        Ok(dev) => mux.install_tmp275(dev),
        Err(e) => {
            faults.raise(FaultKind::MountedSensorAbsent, format_args!("mux[{m}] TMP275 init: {e}"));
        }
    }
}

fn install_hdc1080<I2C, D, F>(
    mux: &mut Multiplexer,
    bus: &mut Bus<I2C, D>,
    faults: &mut F,
    humidity_acks: bool,
    pt_acks: bool,
) where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let m = mux.index();
    if humidity_acks && pt_acks {
        faults.raise(
            FaultKind::WrongDeviceAnswered,
            format_args!("mux[{m}] expected HDC1080, MS8607 answered"),
        );
        return;
    }
    if !humidity_acks {
        faults.raise(FaultKind::MountedSensorAbsent, format_args!("mux[{m}] HDC1080 absent"));
        return;
    }
    match Hdc1080::init(bus, MOUNTED_HUMIDITY) {
        Ok(dev) => mux.install_hdc1080(dev),
        Err(e) => {
            faults.raise(FaultKind::MountedSensorAbsent, format_args!("mux[{m}] HDC1080 init: {e}"));
        }
    }
}

fn install_ms8607<I2C, D, F>(
    mux: &mut Multiplexer,
    bus: &mut Bus<I2C, D>,
    faults: &mut F,
    humidity_acks: bool,
    pt_acks: bool,
) where
    I2C: I2c,
    D: DelayNs,
    F: FaultSink + ?Sized,
{
    let m = mux.index();
    if humidity_acks && !pt_acks {
        faults.raise(
            FaultKind::WrongDeviceAnswered,
            format_args!("mux[{m}] expected MS8607, only 0x{MOUNTED_HUMIDITY:02X} answered"),
        );
        return;
    }
    if !(humidity_acks && pt_acks) {
        faults.raise(FaultKind::MountedSensorAbsent, format_args!("mux[{m}] MS8607 absent"));
        return;
    }
    match Ms8607::init(bus, MOUNTED_MS8607_PT, MOUNTED_HUMIDITY) {
        Ok(dev) => mux.install_ms8607(dev),
        Err(e) => {
            faults.raise(FaultKind::MountedSensorAbsent, format_args!("mux[{m}] MS8607 init: {e}"));
        }
    }
}

/// Disconnect every port of `mux` so the next multiplexer's devices
/// cannot collide with this one's.
pub(crate) fn isolate<I2C: I2c, D: DelayNs>(mux: &mut Multiplexer, bus: &mut Bus<I2C, D>) {
    if let Err(e) = mux.driver.disable(bus) {
        warn!("mux[{}] disable failed: {e}", mux.index());
    }
}

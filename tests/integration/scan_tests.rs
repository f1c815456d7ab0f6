//! Scan engine: readings, fault deduplication and fault episodes.

use muxsense::addresses::MOUNTED_PORT;
use muxsense::adapters::fault_log::FaultLog;
use muxsense::app::ports::FaultSink;
use muxsense::bus::Bus;
use muxsense::config::SensorBusConfig;
use muxsense::discovery::discover;
use muxsense::error::FaultKind;
use muxsense::scan::{ScanReport, scan};
use muxsense::topology::Topology;

use crate::sim_bus::{self, NoDelay, SimBus, assembly_page, sensor_page};

struct Rig {
    bus: Bus<SimBus, NoDelay>,
    topology: Topology,
    faults: FaultLog,
}

impl Rig {
    fn new(sim: SimBus) -> Self {
        let mut bus = sim_bus::bus(sim);
        let mut faults = FaultLog::new();
        let topology = discover(&mut bus, &mut faults, &SensorBusConfig::default());
        Self {
            bus,
            topology,
            faults,
        }
    }

    fn scan(&mut self, auto_clear: bool) -> ScanReport {
        scan(&mut self.topology, &mut self.bus, &mut self.faults, auto_clear)
    }

    fn reports_of(&self, kind: FaultKind) -> usize {
        self.faults.history().filter(|r| r.kind == kind).count()
    }
}

fn mounted_pages(sensors: &[[u8; 32]]) -> Vec<[u8; 32]> {
    let mut pages = vec![assembly_page("MUX_BOARD", 1, 0)];
    pages.extend_from_slice(sensors);
    pages
}

#[test]
fn visits_exactly_the_discovered_slots() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    sim.add_port_sensor(0, 0, 0);
    sim.add_port_sensor(0, 1, 0);
    sim.add_port_sensor(0, 1, 1);
    let mut rig = Rig::new(sim);

    let report = rig.scan(true);

    assert_eq!(report.port_reads, 3);
    assert_eq!(report.mounted_reads, 0);
    assert!(report.is_clean());
    let r = rig.topology.port_reading(0, 1, 1).unwrap();
    assert!(r.is_valid());
    assert!((r.value().unwrap().celsius - 20.0).abs() < 0.01);
    assert!((r.value().unwrap().fahrenheit - 68.0).abs() < 0.01);
}

#[test]
fn empty_topology_scans_nothing() {
    let mut rig = Rig::new(SimBus::new());
    rig.bus.i2c_mut().clear_history();
    assert_eq!(rig.scan(true), ScanReport::default());
    assert!(rig.bus.i2c_mut().history.is_empty());
}

#[test]
fn same_kind_reported_once_per_cycle() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    let a = sim.add_port_sensor(0, 0, 0);
    let b = sim.add_port_sensor(0, 0, 1);
    sim.add_port_sensor(0, 0, 2);
    let mut rig = Rig::new(sim);
    a.borrow_mut().fail_reads = true;
    b.borrow_mut().fail_reads = true;

    let report = rig.scan(false);

    assert_eq!(report.port_failures, 2);
    assert_eq!(report.port_reads, 1);
    assert_eq!(rig.reports_of(FaultKind::ExtSensorRead), 1);
    assert_eq!(
        rig.faults
            .last(FaultKind::ExtSensorRead)
            .map(|r| r.detail.as_str()),
        Some("mux[0].port[0].sensor[0]")
    );
    assert!(rig.topology.port_reading(0, 0, 2).unwrap().is_valid());
}

#[test]
fn same_kind_reported_once_across_cycles() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    let a = sim.add_port_sensor(0, 0, 0);
    let mut rig = Rig::new(sim);
    a.borrow_mut().fail_reads = true;

    for _ in 0..5 {
        rig.scan(true);
    }

    assert_eq!(rig.reports_of(FaultKind::ExtSensorRead), 1);
    assert!(rig.faults.is_active(FaultKind::ExtSensorRead));
    assert_eq!(
        rig.topology.port_reading(0, 0, 0).unwrap().consecutive_failures(),
        5
    );
}

#[test]
fn clean_cycle_ends_the_episode() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    let a = sim.add_port_sensor(0, 0, 0);
    let mut rig = Rig::new(sim);

    a.borrow_mut().fail_reads = true;
    rig.scan(true);
    a.borrow_mut().fail_reads = false;
    rig.scan(true);
    assert!(!rig.faults.is_active(FaultKind::ExtSensorRead));

    a.borrow_mut().fail_reads = true;
    rig.scan(true);
    assert_eq!(rig.reports_of(FaultKind::ExtSensorRead), 2);
}

#[test]
fn without_auto_clear_the_episode_waits_for_acknowledge() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    let a = sim.add_port_sensor(0, 0, 0);
    let mut rig = Rig::new(sim);

    a.borrow_mut().fail_reads = true;
    rig.scan(false);
    a.borrow_mut().fail_reads = false;
    rig.scan(false);
    assert!(rig.faults.is_active(FaultKind::ExtSensorRead));

    rig.faults.acknowledge(FaultKind::ExtSensorRead);
    a.borrow_mut().fail_reads = true;
    rig.scan(false);
    assert_eq!(rig.reports_of(FaultKind::ExtSensorRead), 2);
}

#[test]
fn failure_keeps_last_good_value() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    let a = sim.add_port_sensor(0, 0, 0);
    let mut rig = Rig::new(sim);

    a.borrow_mut().set_celsius(30.0);
    rig.scan(true);
    a.borrow_mut().fail_reads = true;
    rig.scan(true);

    let r = rig.topology.port_reading(0, 0, 0).unwrap();
    assert!(!r.is_valid());
    assert!((r.value().unwrap().celsius - 30.0).abs() < 0.01);
    assert_eq!(r.reads(), 1);
    assert_eq!(r.failures(), 1);
}

#[test]
fn different_kinds_each_get_a_report() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    let port = sim.add_port_sensor(0, 0, 0);
    sim.add_mounted_eeprom(
        0,
        &mounted_pages(&[sensor_page("TMP275", 0x4F), sensor_page("HDC1080", 0x40)]),
    );
    let tmp = sim.add_mounted_tmp275(0);
    let hdc = sim.add_mounted_hdc1080(0);
    let mut rig = Rig::new(sim);

    port.borrow_mut().fail_reads = true;
    tmp.borrow_mut().fail_reads = true;
    hdc.borrow_mut().fail_reads = true;
    let report = rig.scan(true);

    assert_eq!(report.port_failures, 1);
    assert_eq!(report.mounted_failures, 2);
    assert_eq!(rig.reports_of(FaultKind::ExtSensorRead), 1);
    assert_eq!(rig.reports_of(FaultKind::MountedTmp275Read), 1);
    assert_eq!(rig.reports_of(FaultKind::MountedHdc1080Read), 1);
}

#[test]
fn mounted_readings_are_refreshed() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    sim.add_mounted_eeprom(0, &mounted_pages(&[sensor_page("HDC1080", 0x40)]));
    sim.add_mounted_hdc1080(0);
    sim.add_mux(1);
    sim.add_mounted_eeprom(
        1,
        &mounted_pages(&[sensor_page("TMP275", 0x4F), sensor_page("MS8607PT", 0x76)]),
    );
    sim.add_mounted_tmp275(1);
    sim.add_mounted_ms8607(1);
    let mut rig = Rig::new(sim);

    let report = rig.scan(true);
    assert_eq!(report.mounted_reads, 3);
    assert!(report.is_clean());

    let climate = rig.topology.mounted_hdc1080(0).unwrap().value().unwrap();
    assert!((climate.humidity_rh - 50.0).abs() < 0.01);
    assert!((climate.temperature.celsius - 21.875).abs() < 0.01);

    let mux1 = rig.topology.mux(1).unwrap();
    let baro = mux1.mounted_ms8607().unwrap().value().unwrap();
    assert!((baro.pressure_mbar - 1100.02).abs() < 0.05);
    assert!((baro.temperature.celsius - 20.0).abs() < 0.01);
    let t = mux1.mounted_tmp275().unwrap().value().unwrap();
    assert!((t.fahrenheit - 77.0).abs() < 0.01);
}

#[test]
fn mounted_routing_failure_skips_only_mounted_work() {
    let mut sim = SimBus::new();
    let mux = sim.add_mux(0);
    sim.add_port_sensor(0, 0, 0);
    sim.add_mounted_eeprom(0, &mounted_pages(&[sensor_page("TMP275", 0x4F)]));
    sim.add_mounted_tmp275(0);
    let mut rig = Rig::new(sim);

    mux.borrow_mut().fail_ports = 1 << MOUNTED_PORT;
    let report = rig.scan(true);

    assert_eq!(report.routing_failures, 1);
    assert_eq!(report.port_reads, 1);
    assert_eq!(report.mounted_reads, 0);
    assert!(rig.faults.is_active(FaultKind::MuxRouting));

    // Routing recovers; the next clean cycle closes the episode.
    mux.borrow_mut().fail_ports = 0;
    let report = rig.scan(true);
    assert_eq!(report.mounted_reads, 1);
    assert!(!rig.faults.is_active(FaultKind::MuxRouting));
}

#[test]
fn port_routing_failure_abandons_rest_of_mux() {
    let mut sim = SimBus::new();
    let mux = sim.add_mux(0);
    sim.add_port_sensor(0, 0, 0);
    sim.add_port_sensor(0, 1, 0);
    sim.add_port_sensor(0, 2, 0);
    let mut rig = Rig::new(sim);

    mux.borrow_mut().fail_ports = 1 << 1;
    let report = rig.scan(true);

    assert_eq!(report.port_reads, 1);
    assert_eq!(report.routing_failures, 1);
    assert_eq!(rig.reports_of(FaultKind::MuxRouting), 1);
    assert_eq!(rig.topology.port_reading(0, 2, 0).unwrap().reads(), 0);
}

#[test]
fn scan_never_routes_two_muxes_at_once() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    sim.add_mux(1);
    sim.add_port_sensor(0, 0, 0);
    sim.add_port_sensor(1, 0, 0);
    let mut rig = Rig::new(sim);
    rig.bus.i2c_mut().clear_history();

    let report = rig.scan(true);

    assert_eq!(report.port_reads, 2);
    assert!(!rig.bus.i2c_mut().saw_collision());
}

#[test]
fn sensors_behind_an_empty_first_mux_are_not_polled() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    sim.add_mux(1);
    sim.add_port_sensor(1, 0, 0);
    sim.add_mounted_eeprom(1, &mounted_pages(&[sensor_page("TMP275", 0x4F)]));
    sim.add_mounted_tmp275(1);
    let mut rig = Rig::new(sim);
    assert_eq!(rig.topology.port_sensor_count(), 1);

    let report = rig.scan(true);

    // The port pass ends at mux 0; the mounted pass still reaches mux 1.
    assert_eq!(report.port_reads, 0);
    assert_eq!(report.mounted_reads, 1);
    let r = rig.topology.port_reading(1, 0, 0).unwrap();
    assert_eq!(r.reads(), 0);
    assert!(r.value().is_none());
    assert!(report.is_clean());
}

#[test]
fn port_routing_failure_keeps_read_episode_open() {
    let mut sim = SimBus::new();
    let mux = sim.add_mux(0);
    sim.add_port_sensor(0, 0, 0);
    let flaky = sim.add_port_sensor(0, 1, 0);
    let mut rig = Rig::new(sim);

    flaky.borrow_mut().fail_reads = true;
    rig.scan(true);
    assert!(rig.faults.is_active(FaultKind::ExtSensorRead));

    // Sensor recovers, but no port is reached this cycle.
    flaky.borrow_mut().fail_reads = false;
    mux.borrow_mut().fail_ports = 1 << 0;
    let report = rig.scan(true);
    assert_eq!(report.port_reads, 0);
    assert!(rig.faults.is_active(FaultKind::ExtSensorRead));
    assert!(rig.faults.is_active(FaultKind::MuxRouting));

    mux.borrow_mut().fail_ports = 0;
    let report = rig.scan(true);
    assert_eq!(report.port_reads, 2);
    assert!(!rig.faults.is_active(FaultKind::ExtSensorRead));
    assert!(!rig.faults.is_active(FaultKind::MuxRouting));
    assert_eq!(rig.reports_of(FaultKind::ExtSensorRead), 1);
}

#[test]
fn mounted_routing_failure_keeps_mounted_episode_open() {
    let mut sim = SimBus::new();
    let mux = sim.add_mux(0);
    sim.add_mounted_eeprom(0, &mounted_pages(&[sensor_page("TMP275", 0x4F)]));
    let tmp = sim.add_mounted_tmp275(0);
    let mut rig = Rig::new(sim);

    tmp.borrow_mut().fail_reads = true;
    rig.scan(true);
    assert!(rig.faults.is_active(FaultKind::MountedTmp275Read));

    tmp.borrow_mut().fail_reads = false;
    mux.borrow_mut().fail_ports = 1 << MOUNTED_PORT;
    rig.scan(true);
    assert!(rig.faults.is_active(FaultKind::MountedTmp275Read));

    mux.borrow_mut().fail_ports = 0;
    rig.scan(true);
    assert!(!rig.faults.is_active(FaultKind::MountedTmp275Read));
    assert_eq!(rig.reports_of(FaultKind::MountedTmp275Read), 1);
}

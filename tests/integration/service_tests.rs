//! SensorService orchestration: lifecycle, events and status display.

use muxsense::adapters::config_store::MemConfigStore;
use muxsense::adapters::fault_log::{FaultLog, SharedFaultLog};
use muxsense::app::events::AppEvent;
use muxsense::app::ports::{ConfigPort, DisplaySink, EventSink, FaultSink};
use muxsense::app::service::SensorService;
use muxsense::bus::Bus;
use muxsense::config::SensorBusConfig;
use muxsense::error::{Error, FaultKind};

use crate::sim_bus::{self, NoDelay, SimBus, assembly_page, sensor_page};

// ── Recording adapters ────────────────────────────────────────

#[derive(Default)]
struct Events(Vec<AppEvent>);

impl EventSink for Events {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

#[derive(Default)]
struct Screen(Vec<String>);

impl DisplaySink for Screen {
    fn show(&mut self, line: &str) {
        self.0.push(line.to_owned());
    }
}

fn service(sim: SimBus) -> SensorService<SimBus, NoDelay> {
    SensorService::new(sim_bus::bus(sim), SensorBusConfig::default())
}

/// mux0: mounted TMP275 (25 °C); port0 two sensors, port1 one sensor (20 °C).
fn habitat() -> SimBus {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    sim.add_port_sensor(0, 0, 0);
    sim.add_port_sensor(0, 0, 1);
    sim.add_port_sensor(0, 1, 0);
    sim.add_mounted_eeprom(
        0,
        &[assembly_page("HAB_A", 1, 0), sensor_page("TMP275", 0x4F)],
    );
    sim.add_mounted_tmp275(0);
    sim
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn scan_before_discovery_is_refused() {
    let mut svc = service(habitat());
    let result = svc.scan(&mut FaultLog::new(), &mut Events::default());
    assert_eq!(result, Err(Error::NotReady));
    assert_eq!(svc.cycles(), 0);
}

#[test]
fn discovery_emits_start_and_summary() {
    let mut svc = service(habitat());
    let mut events = Events::default();

    let topology = svc.discover(&mut FaultLog::new(), &mut events);
    assert_eq!(topology.port_sensor_count(), 3);

    assert!(matches!(events.0[0], AppEvent::DiscoveryStarted));
    let AppEvent::DiscoveryComplete(summary) = &events.0[1] else {
        panic!("expected DiscoveryComplete, got {:?}", events.0[1]);
    };
    assert_eq!(summary.muxes, 1);
    assert_eq!(summary.ports, 2);
    assert_eq!(summary.port_sensors, 3);
    assert_eq!(summary.mounted.len(), 1);
}

#[test]
fn discovery_runs_once() {
    let mut svc = service(habitat());
    let mut faults = FaultLog::new();
    let mut events = Events::default();
    svc.discover(&mut faults, &mut events);
    svc.bus_mut().i2c_mut().clear_history();

    let again = svc.discover(&mut faults, &mut events).port_sensor_count();

    assert_eq!(again, 3);
    assert!(svc.bus_mut().i2c_mut().history.is_empty());
    assert_eq!(events.0.len(), 2);
}

#[test]
fn scans_count_cycles_and_emit_reports() {
    let mut svc = service(habitat());
    let mut faults = FaultLog::new();
    let mut events = Events::default();
    svc.discover(&mut faults, &mut events);

    for _ in 0..3 {
        svc.scan(&mut faults, &mut events).unwrap();
    }

    assert_eq!(svc.cycles(), 3);
    assert_eq!(svc.last_report().port_reads, 3);
    assert_eq!(svc.last_report().mounted_reads, 1);
    let AppEvent::ScanComplete { cycle, report } = events.0.last().unwrap() else {
        panic!("expected ScanComplete");
    };
    assert_eq!(*cycle, 3);
    assert!(report.is_clean());
}

#[test]
fn shared_fault_log_serves_as_reporter() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    let sensor = sim.add_port_sensor(0, 0, 0);
    let mut svc = service(sim);
    let log = SharedFaultLog::new();
    let mut handle = &log;
    let mut events = Events::default();

    svc.discover(&mut handle, &mut events);
    sensor.borrow_mut().fail_reads = true;
    svc.scan(&mut handle, &mut events).unwrap();
    svc.scan(&mut handle, &mut events).unwrap();

    assert!(handle.is_active(FaultKind::ExtSensorRead));
    assert_eq!(log.with(|l| l.raised_count()), 1);
    assert_eq!(log.with(|l| l.suppressed_count()), 0);
}

#[test]
fn service_uses_stored_config() {
    let store = MemConfigStore::new();
    store
        .save(&SensorBusConfig {
            auto_clear_faults: false,
            ..SensorBusConfig::default()
        })
        .unwrap();
    let config = store.load().unwrap();

    let mut sim = SimBus::new();
    sim.add_mux(0);
    let sensor = sim.add_port_sensor(0, 0, 0);
    let mut svc: SensorService<SimBus, NoDelay> =
        SensorService::new(Bus::new(sim, NoDelay::default()), config);
    let mut faults = FaultLog::new();
    let mut events = Events::default();
    svc.discover(&mut faults, &mut events);

    sensor.borrow_mut().fail_reads = true;
    svc.scan(&mut faults, &mut events).unwrap();
    sensor.borrow_mut().fail_reads = false;
    svc.scan(&mut faults, &mut events).unwrap();

    // No automatic clearing with this config.
    assert!(!svc.config().auto_clear_faults);
    assert!(faults.is_active(FaultKind::ExtSensorRead));
}

// ── Status display ────────────────────────────────────────────

#[test]
fn status_before_discovery_reports_missing_mux() {
    let mut svc = service(habitat());
    let mut screen = Screen::default();
    svc.show_next(&mut screen);
    assert_eq!(screen.0, ["mux[0] missing"]);
}

#[test]
fn status_walks_mounted_then_slots_and_wraps() {
    let mut svc = service(habitat());
    let mut faults = FaultLog::new();
    let mut events = Events::default();
    let mut screen = Screen::default();
    svc.discover(&mut faults, &mut events);
    svc.scan(&mut faults, &mut events).unwrap();

    for _ in 0..5 {
        svc.show_next(&mut screen);
    }

    assert_eq!(
        screen.0,
        [
            "m[0] 77.0000°F",
            "m[0].p[0].s[0] 68.0000°F",
            "m[0].p[0].s[1] 68.0000°F",
            "m[0].p[1].s[0] 68.0000°F",
            "m[0] 77.0000°F",
        ]
    );
}

#[test]
fn status_before_first_scan_shows_placeholders() {
    let mut svc = service(habitat());
    let mut screen = Screen::default();
    svc.discover(&mut FaultLog::new(), &mut Events::default());

    svc.show_next(&mut screen);
    svc.show_next(&mut screen);

    assert_eq!(screen.0, ["m[0] --", "m[0].p[0].s[0] --"]);
}

#[test]
fn status_visits_every_mux() {
    let mut sim = SimBus::new();
    sim.add_mux(0);
    sim.add_port_sensor(0, 0, 0);
    sim.add_mux(1);
    let mut svc = service(sim);
    let mut screen = Screen::default();
    svc.discover(&mut FaultLog::new(), &mut Events::default());

    for _ in 0..4 {
        svc.show_next(&mut screen);
    }

    assert_eq!(
        screen.0,
        [
            "m[0] no TMP275",
            "m[0].p[0].s[0] --",
            "m[1] no TMP275",
            "m[0] no TMP275",
        ]
    );
}

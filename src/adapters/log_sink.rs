//! Log-based event and display sink adapters.
//!
//! Implements [`EventSink`] and [`DisplaySink`] by writing tagged lines to
//! the `log` facade (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{DisplaySink, EventSink};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::DiscoveryStarted => {
                info!("DISCOVERY | started");
            }
            AppEvent::DiscoveryComplete(summary) => match serde_json::to_string(summary) {
                Ok(json) => info!("DISCOVERY | complete {json}"),
                Err(_) => info!(
                    "DISCOVERY | complete muxes={} port_sensors={} in {}ms",
                    summary.muxes, summary.port_sensors, summary.elapsed_ms
                ),
            },
            AppEvent::ScanComplete { cycle, report } if !report.is_clean() => {
                warn!(
                    "SCAN | #{} | port {}/{} | mounted {}/{} | routing {}",
                    cycle,
                    report.port_reads,
                    report.port_reads + report.port_failures,
                    report.mounted_reads,
                    report.mounted_reads + report.mounted_failures,
                    report.routing_failures,
                );
            }
            AppEvent::ScanComplete { .. } => {}
        }
    }
}

/// Adapter that writes status lines to the log.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn show(&mut self, line: &str) {
        info!("STATUS | {line}");
    }
}

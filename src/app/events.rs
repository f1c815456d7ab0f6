//! Outbound application events.
//!
//! The [`SensorService`](super::service::SensorService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them.

use serde::Serialize;

use crate::scan::ScanReport;
use crate::topology::TopologySummary;

/// Structured events emitted by the sensor service.
#[derive(Debug, Clone, Serialize)]
pub enum AppEvent {
    /// Discovery pass is about to probe the bus.
    DiscoveryStarted,

    /// Discovery finished; the topology is now fixed.
    DiscoveryComplete(TopologySummary),

    /// One scan cycle finished.
    ScanComplete { cycle: u32, report: ScanReport },
}

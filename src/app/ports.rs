//! Port traits: the hexagonal boundary between the sensor engines and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ discovery / scan / SensorService
//! ```
//!
//! The engines consume these via generics, so fault reporting, event
//! logging, display and persistence are all swappable on host.

use core::fmt;

use crate::config::SensorBusConfig;
use crate::error::FaultKind;

// ───────────────────────────────────────────────────────────────
// Fault sink (driven adapter: engines → fault reporter)
// ───────────────────────────────────────────────────────────────

/// Receives faults keyed by kind and keeps at most one active report per
/// kind until that kind is cleared.
pub trait FaultSink {
    /// Report a fault with a location description.
    ///
    /// Returns `true` if this opened a new active report, `false` if the
    /// kind was already active and the report was suppressed.
    fn raise(&mut self, kind: FaultKind, detail: fmt::Arguments<'_>) -> bool;

    /// Whether an unacknowledged report of `kind` is active.
    fn is_active(&self, kind: FaultKind) -> bool;

    /// End the active episode of `kind`, if any.
    fn clear(&mut self, kind: FaultKind);
}

impl<F: FaultSink + ?Sized> FaultSink for &mut F {
    fn raise(&mut self, kind: FaultKind, detail: fmt::Arguments<'_>) -> bool {
        (**self).raise(kind, detail)
    }

    fn is_active(&self, kind: FaultKind) -> bool {
        (**self).is_active(kind)
    }

    fn clear(&mut self, kind: FaultKind) {
        (**self).clear(kind);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Display sink (driven adapter: domain → status line)
// ───────────────────────────────────────────────────────────────

/// One-line status display.
pub trait DisplaySink {
    fn show(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists sensor bus configuration.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Returns [`SensorBusConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SensorBusConfig, ConfigError>;

    fn save(&self, config: &SensorBusConfig) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "stored config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::IoError => write!(f, "storage I/O error"),
        }
    }
}

//! Sensor bus configuration parameters
//!
//! Tunables for the external sensor network. Values can be overridden
//! through a [`ConfigPort`](crate::app::ports::ConfigPort) implementation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core sensor bus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorBusConfig {
    // --- Bus ---
    /// I2C clock (Hz)
    pub i2c_frequency_hz: u32,

    // --- Timing ---
    /// Interval between scan cycles (milliseconds)
    pub scan_interval_ms: u32,
    /// Interval between status display lines (milliseconds)
    pub display_interval_ms: u32,

    // --- Discovery ---
    /// Probe the per-slot identification memory during discovery (log only)
    pub probe_slot_id_memory: bool,

    // --- Faults ---
    /// Clear a scan fault kind after a full cycle without that failure
    pub auto_clear_faults: bool,
}

impl Default for SensorBusConfig {
    fn default() -> Self {
        Self {
            i2c_frequency_hz: 100_000,

            scan_interval_ms: 1000,
            display_interval_ms: 2000, // one reading every other second

            probe_slot_id_memory: true,

            auto_clear_faults: true,
        }
    }
}

impl SensorBusConfig {
    /// Reject out-of-range values instead of clamping them.
    pub fn validate(&self) -> Result<()> {
        if !(10_000..=400_000).contains(&self.i2c_frequency_hz) {
            return Err(Error::Config("i2c_frequency_hz must be 10000-400000"));
        }
        if !(100..=60_000).contains(&self.scan_interval_ms) {
            return Err(Error::Config("scan_interval_ms must be 100-60000"));
        }
        if !(250..=60_000).contains(&self.display_interval_ms) {
            return Err(Error::Config("display_interval_ms must be 250-60000"));
        }
        Ok(())
    }
}

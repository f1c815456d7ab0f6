//! Reading records shared by the port sensors and the mux-mounted sensors.
//!
//! A [`SensorReading`] keeps the last *good* value alongside validity and
//! failure bookkeeping. A failed read never overwrites the last good value,
//! so a single flaky sensor does not blank the display or the log.

use serde::Serialize;

use crate::error::Error;

/// A temperature sample in both scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Temperature {
    pub celsius: f32,
    pub fahrenheit: f32,
}

impl Temperature {
    pub fn from_celsius(celsius: f32) -> Self {
        Self {
            celsius,
            fahrenheit: celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

/// HDC1080 sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Climate {
    pub temperature: Temperature,
    /// Relative humidity (%).
    pub humidity_rh: f32,
}

/// MS8607 sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Barometric {
    pub temperature: Temperature,
    /// Absolute pressure (mbar).
    pub pressure_mbar: f32,
    /// Relative humidity (%).
    pub humidity_rh: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct SensorReading<T> {
    last: Option<T>,
    valid: bool,
    consecutive_failures: u16,
    reads: u32,
    failures: u32,
    last_error: Option<Error>,
}

impl<T> Default for SensorReading<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SensorReading<T> {
    pub const fn new() -> Self {
        Self {
            last: None,
            valid: false,
            consecutive_failures: 0,
            reads: 0,
            failures: 0,
            last_error: None,
        }
    }

    /// True if the most recent read attempt succeeded.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn consecutive_failures(&self) -> u16 {
        self.consecutive_failures
    }

    /// Successful reads since discovery.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Failed reads since discovery.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Fold one read attempt into the record. Returns `true` on success.
    pub(crate) fn record(&mut self, result: Result<T, Error>) -> bool {
        match result {
            Ok(value) => {
                self.last = Some(value);
                self.valid = true;
                self.consecutive_failures = 0;
                self.reads = self.reads.saturating_add(1);
                true
            }
            Err(e) => {
                self.valid = false;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.failures = self.failures.saturating_add(1);
                self.last_error = Some(e);
                false
            }
        }
    }
}

impl<T: Copy> SensorReading<T> {
    /// Last good value, retained across failed reads.
    pub fn value(&self) -> Option<T> {
        self.last
    }
}

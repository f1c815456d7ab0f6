//! Bus probe and typed transaction wrapper.
//!
//! [`Bus`] owns the I2C peripheral and a delay provider and is the only
//! thing the drivers and engines talk to. It is generic over the
//! `embedded-hal` 1.0 traits, so on target it wraps the ESP-IDF I2C driver
//! and on host it wraps the simulated bus used by the tests.
//!
//! There is exactly one `Bus` per physical bus and every method takes
//! `&mut self`: multiplexer routing state is shared by everything on the
//! bus, so exclusive access is what keeps discovery and scan from
//! interleaving.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::debug;

use crate::error::BusError;

/// Outcome of an address-only transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn is_present(self) -> bool {
        self == Self::Present
    }
}

pub struct Bus<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C, D> Bus<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Issue an address-only write and report whether anything acknowledged.
    ///
    /// No retries; callers own the retry policy. Any transport error other
    /// than a NACK is also reported as `Absent` since the device could not
    /// be confirmed.
    pub fn probe(&mut self, address: u8) -> Presence {
        match self.i2c.write(address, &[]) {
            Ok(()) => Presence::Present,
            Err(e) => {
                let err = BusError::from(e.kind());
                if err != BusError::Nack {
                    debug!("probe 0x{:02X}: {}", address, err);
                }
                Presence::Absent
            }
        }
    }

    pub fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.i2c.write(address, bytes).map_err(|e| e.kind().into())
    }

    pub fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c.read(address, buf).map_err(|e| e.kind().into())
    }

    pub fn write_read(&mut self, address: u8, bytes: &[u8], buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .write_read(address, bytes, buf)
            .map_err(|e| e.kind().into())
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Direct access to the underlying peripheral (fault injection in tests).
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

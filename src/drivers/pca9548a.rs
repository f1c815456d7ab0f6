//! PCA9548A 8-channel I2C multiplexer.
//!
//! The device has a single control register: each bit enables the
//! corresponding downstream channel. This driver only ever enables one
//! channel at a time, or none.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::bus::Bus;
use crate::error::{BusError, Error, Result};

const PORTS_DISABLE: u8 = 0x00;

#[derive(Debug)]
pub struct Pca9548a {
    address: u8,
}

impl Pca9548a {
    /// Disable every channel and confirm the control register reads back.
    pub fn init<I2C: I2c, D: DelayNs>(bus: &mut Bus<I2C, D>, address: u8) -> Result<Self> {
        bus.write(address, &[PORTS_DISABLE])?;
        let mut control = [0u8; 1];
        bus.read(address, &mut control)?;
        if control[0] != PORTS_DISABLE {
            return Err(Error::Init("PCA9548A control readback mismatch"));
        }
        Ok(Self { address })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Route the trunk to `port` (0-7) only.
    pub fn select<I2C: I2c, D: DelayNs>(
        &self,
        bus: &mut Bus<I2C, D>,
        port: u8,
    ) -> core::result::Result<(), BusError> {
        debug_assert!(port < 8, "PCA9548A has 8 channels");
        bus.write(self.address, &[1 << (port & 0x7)])
    }

    /// Disconnect every channel from the trunk.
    pub fn disable<I2C: I2c, D: DelayNs>(
        &self,
        bus: &mut Bus<I2C, D>,
    ) -> core::result::Result<(), BusError> {
        bus.write(self.address, &[PORTS_DISABLE])
    }
}

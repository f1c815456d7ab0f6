//! TMP275 digital temperature sensor.
//!
//! Run at 12-bit resolution (0.0625 °C per count). The temperature
//! register is left-justified: the low nibble of the second byte is
//! always zero.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::bus::Bus;
use crate::error::{Error, Result};
use crate::readings::Temperature;

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

/// R1:R0 = 11 → 12-bit conversions, continuous mode, comparator defaults.
const CFG_RES12: u8 = 0x60;
const CFG_RES_MASK: u8 = 0x60;

const DEG_C_PER_COUNT: f32 = 0.0625;

#[derive(Debug)]
pub struct Tmp275 {
    address: u8,
}

impl Tmp275 {
    /// Configure 12-bit resolution and verify the configuration took.
    pub fn init<I2C: I2c, D: DelayNs>(bus: &mut Bus<I2C, D>, address: u8) -> Result<Self> {
        bus.write(address, &[REG_CONFIG, CFG_RES12])?;
        let mut config = [0u8; 1];
        bus.write_read(address, &[REG_CONFIG], &mut config)?;
        if config[0] & CFG_RES_MASK != CFG_RES12 {
            return Err(Error::Init("TMP275 resolution readback mismatch"));
        }
        Ok(Self { address })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read<I2C: I2c, D: DelayNs>(&self, bus: &mut Bus<I2C, D>) -> Result<Temperature> {
        let mut raw = [0u8; 2];
        bus.write_read(self.address, &[REG_TEMPERATURE], &mut raw)?;
        Ok(Temperature::from_celsius(celsius_from_raw(raw)))
    }
}

/// Convert the two temperature-register bytes to °C.
pub fn celsius_from_raw(raw: [u8; 2]) -> f32 {
    let counts = i16::from_be_bytes(raw) >> 4;
    counts as f32 * DEG_C_PER_COUNT
}

//! HDC1080 temperature and relative-humidity sensor.
//!
//! Shares bus address 0x40 with the humidity half of the MS8607, so
//! `init` checks the manufacturer and device IDs before accepting the
//! part. Measurements use the combined mode: one trigger, both results.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::bus::Bus;
use crate::error::{Error, Result};
use crate::readings::{Climate, Temperature};

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x02;
const REG_MANUFACTURER_ID: u8 = 0xFE;
const REG_DEVICE_ID: u8 = 0xFF;

const MANUFACTURER_ID: u16 = 0x5449;
const DEVICE_ID: u16 = 0x1050;

/// MODE = 1 (temperature then humidity), 14-bit both.
const CFG_ACQUIRE_BOTH: u16 = 0x1000;

/// 6.35 ms + 6.5 ms at 14 bit, rounded up with margin.
const CONVERSION_MS: u32 = 15;

#[derive(Debug)]
pub struct Hdc1080 {
    address: u8,
}

impl Hdc1080 {
    pub fn init<I2C: I2c, D: DelayNs>(bus: &mut Bus<I2C, D>, address: u8) -> Result<Self> {
        if read_u16(bus, address, REG_MANUFACTURER_ID)? != MANUFACTURER_ID {
            return Err(Error::Init("HDC1080 manufacturer ID mismatch"));
        }
        if read_u16(bus, address, REG_DEVICE_ID)? != DEVICE_ID {
            return Err(Error::Init("HDC1080 device ID mismatch"));
        }
        let [hi, lo] = CFG_ACQUIRE_BOTH.to_be_bytes();
        bus.write(address, &[REG_CONFIG, hi, lo])?;
        Ok(Self { address })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read<I2C: I2c, D: DelayNs>(&self, bus: &mut Bus<I2C, D>) -> Result<Climate> {
        bus.write(self.address, &[REG_TEMPERATURE])?;
        bus.delay_ms(CONVERSION_MS);
        let mut raw = [0u8; 4];
        bus.read(self.address, &mut raw)?;
        let t = u16::from_be_bytes([raw[0], raw[1]]);
        let h = u16::from_be_bytes([raw[2], raw[3]]);
        Ok(Climate {
            temperature: Temperature::from_celsius(celsius_from_raw(t)),
            humidity_rh: humidity_from_raw(h),
        })
    }
}

fn read_u16<I2C: I2c, D: DelayNs>(bus: &mut Bus<I2C, D>, address: u8, reg: u8) -> Result<u16> {
    let mut buf = [0u8; 2];
    bus.write_read(address, &[reg], &mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub fn celsius_from_raw(raw: u16) -> f32 {
    raw as f32 / 65536.0 * 165.0 - 40.0
}

pub fn humidity_from_raw(raw: u16) -> f32 {
    raw as f32 / 65536.0 * 100.0
}

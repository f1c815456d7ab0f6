//! MS8607 pressure, temperature and humidity sensor.
//!
//! The part answers at two addresses: the pressure/temperature die at
//! 0x76 and the humidity die at 0x40 (the same address as an HDC1080).
//! Pressure and temperature use first-order compensation only; the
//! second-order low-temperature correction is not applied.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::bus::Bus;
use crate::error::{Error, Result};
use crate::readings::{Barometric, Temperature};

// Pressure/temperature die
const PT_RESET: u8 = 0x1E;
const PT_PROM_READ: u8 = 0xA0;
const PT_CONVERT_D1_OSR8192: u8 = 0x4A;
const PT_CONVERT_D2_OSR8192: u8 = 0x5A;
const PT_ADC_READ: u8 = 0x00;
const PT_CONVERSION_MS: u32 = 18;

// Humidity die
const RH_RESET: u8 = 0xFE;
const RH_MEASURE_NO_HOLD: u8 = 0xF5;
const RH_CONVERSION_MS: u32 = 16;

const RESET_MS: u32 = 15;
const PROM_WORDS: usize = 7;

/// Factory calibration words C1..C6 (C0 holds CRC and factory data).
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    c: [u16; PROM_WORDS],
}

impl Calibration {
    pub fn from_prom(words: [u16; PROM_WORDS]) -> Result<Self> {
        let coeffs = &words[1..];
        if coeffs.iter().all(|&w| w == 0) || coeffs.iter().all(|&w| w == 0xFFFF) {
            return Err(Error::Init("MS8607 PROM blank"));
        }
        Ok(Self { c: words })
    }

    /// First-order compensation. Returns (°C, mbar).
    pub fn compensate(&self, d1: u32, d2: u32) -> (f32, f32) {
        let c = |i: usize| i64::from(self.c[i]);
        let d_t = i64::from(d2) - (c(5) << 8);
        let temp = 2000 + ((d_t * c(6)) >> 23);
        let off = (c(2) << 17) + ((c(4) * d_t) >> 6);
        let sens = (c(1) << 16) + ((c(3) * d_t) >> 7);
        let p = (((i64::from(d1) * sens) >> 21) - off) >> 15;
        (temp as f32 / 100.0, p as f32 / 100.0)
    }
}

#[derive(Debug)]
pub struct Ms8607 {
    pt_address: u8,
    rh_address: u8,
    calibration: Calibration,
}

impl Ms8607 {
    pub fn init<I2C: I2c, D: DelayNs>(
        bus: &mut Bus<I2C, D>,
        pt_address: u8,
        rh_address: u8,
    ) -> Result<Self> {
        bus.write(pt_address, &[PT_RESET])?;
        bus.write(rh_address, &[RH_RESET])?;
        bus.delay_ms(RESET_MS);

        let mut words = [0u16; PROM_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            let mut buf = [0u8; 2];
            bus.write_read(pt_address, &[PT_PROM_READ + (i as u8) * 2], &mut buf)?;
            *word = u16::from_be_bytes(buf);
        }

        Ok(Self {
            pt_address,
            rh_address,
            calibration: Calibration::from_prom(words)?,
        })
    }

    pub fn read<I2C: I2c, D: DelayNs>(&self, bus: &mut Bus<I2C, D>) -> Result<Barometric> {
        let d1 = self.convert(bus, PT_CONVERT_D1_OSR8192)?;
        let d2 = self.convert(bus, PT_CONVERT_D2_OSR8192)?;
        let (celsius, pressure_mbar) = self.calibration.compensate(d1, d2);

        bus.write(self.rh_address, &[RH_MEASURE_NO_HOLD])?;
        bus.delay_ms(RH_CONVERSION_MS);
        let mut rh = [0u8; 3];
        bus.read(self.rh_address, &mut rh)?;
        // Two status bits in the LSB; third byte is CRC.
        let raw = u16::from_be_bytes([rh[0], rh[1]]) & 0xFFFC;

        Ok(Barometric {
            temperature: Temperature::from_celsius(celsius),
            pressure_mbar,
            humidity_rh: humidity_from_raw(raw),
        })
    }

    fn convert<I2C: I2c, D: DelayNs>(&self, bus: &mut Bus<I2C, D>, command: u8) -> Result<u32> {
        bus.write(self.pt_address, &[command])?;
        bus.delay_ms(PT_CONVERSION_MS);
        let mut adc = [0u8; 3];
        bus.write_read(self.pt_address, &[PT_ADC_READ], &mut adc)?;
        Ok(u32::from_be_bytes([0, adc[0], adc[1], adc[2]]))
    }
}

pub fn humidity_from_raw(raw: u16) -> f32 {
    -6.0 + 125.0 * raw as f32 / 65536.0
}

//! M24C32 4 KiB identification EEPROM (128 pages of 32 bytes).
//!
//! Only the read path is needed at runtime: the memory is programmed at
//! assembly time. Reads use a 16-bit big-endian memory address followed
//! by a sequential read.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::bus::Bus;
use crate::error::Result;

pub const PAGE_SIZE: usize = 32;
pub const PAGE_COUNT: u16 = 128;

#[derive(Debug)]
pub struct M24c32 {
    address: u8,
}

impl M24c32 {
    /// The memory needs no setup; presence is confirmed by the caller's probe.
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read<I2C: I2c, D: DelayNs>(
        &self,
        bus: &mut Bus<I2C, D>,
        offset: u16,
        buf: &mut [u8],
    ) -> Result<()> {
        bus.write_read(self.address, &offset.to_be_bytes(), buf)?;
        Ok(())
    }

    pub fn read_page<I2C: I2c, D: DelayNs>(
        &self,
        bus: &mut Bus<I2C, D>,
        page: u16,
    ) -> Result<[u8; PAGE_SIZE]> {
        debug_assert!(page < PAGE_COUNT);
        let mut buf = [0u8; PAGE_SIZE];
        self.read(bus, page * PAGE_SIZE as u16, &mut buf)?;
        Ok(buf)
    }
}

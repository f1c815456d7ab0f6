//! Identification-memory record decoding.
//!
//! The mux-mounted M24C32 carries a fixed layout of 32-byte pages:
//!
//! ```text
//! page 0  assembly identity
//!   0x00  name          16 B  ASCII [A-Z0-9_], NUL-terminated, NUL-filled
//!   0x10  rev minor      1 B
//!   0x11  rev major      1 B
//!   0x12  manufactured   4 B  LE, seconds since epoch
//!   0x16  serviced       4 B  LE, seconds since epoch
//!   0x1A  reserved       6 B
//! page 1  sensor-1 identity
//!   0x00  type name     16 B  one of TMP275, HDC1080, MS8607PT, MS8607H
//!   0x10  address        1 B  bit 7 = absolute, bits 6..0 = address
//!   0x11  reserved      15 B
//! page 2  sensor-2 identity (same layout as page 1)
//! ```
//!
//! Everything here is pure: bytes in, typed records out.

use core::fmt;

use heapless::String;
use serde::Serialize;

use crate::addresses;
use crate::error::DecodeError;
use crate::topology::Capabilities;

pub use crate::drivers::m24c32::PAGE_SIZE;
pub const NAME_LEN: usize = 16;

pub const ASSEMBLY_PAGE: u16 = 0;
pub const SENSOR1_PAGE: u16 = 1;
pub const SENSOR2_PAGE: u16 = 2;

/// Value of an erased EEPROM cell.
pub const ERASED: u8 = 0xFF;
/// Leading byte left by the earlier raw-bitfield format (TMP275 | HDC1080).
pub const LEGACY_PLACEHOLDER: u8 = 0x05;

const OFF_REV_MINOR: usize = 0x10;
const OFF_REV_MAJOR: usize = 0x11;
const OFF_MANUFACTURED: usize = 0x12;
const OFF_SERVICED: usize = 0x16;
const OFF_SENSOR_ADDRESS: usize = 0x10;

const ABSOLUTE_FLAG: u8 = 0x80;

pub type Name = String<NAME_LEN>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyIdentity {
    pub name: Name,
    pub revision: Revision,
    pub manufacture_date: u32,
    pub service_date: u32,
}

impl AssemblyIdentity {
    /// Encode into a page image (used when provisioning a board).
    pub fn to_page(&self) -> [u8; PAGE_SIZE] {
        let mut page = [0u8; PAGE_SIZE];
        encode_name(&mut page, &self.name);
        page[OFF_REV_MINOR] = self.revision.minor;
        page[OFF_REV_MAJOR] = self.revision.major;
        page[OFF_MANUFACTURED..OFF_MANUFACTURED + 4]
            .copy_from_slice(&self.manufacture_date.to_le_bytes());
        page[OFF_SERVICED..OFF_SERVICED + 4].copy_from_slice(&self.service_date.to_le_bytes());
        page
    }
}

/// Where a mounted sensor answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SensorAddress {
    /// Use as-is.
    Absolute(u8),
    /// Combine with the multiplexer index (low three bits).
    Base(u8),
}

impl SensorAddress {
    pub fn from_byte(byte: u8) -> Self {
        let value = byte & !ABSOLUTE_FLAG;
        if byte & ABSOLUTE_FLAG != 0 {
            Self::Absolute(value)
        } else {
            Self::Base(value)
        }
    }

    pub fn resolve(self, mux: usize) -> u8 {
        match self {
            Self::Absolute(a) => a,
            Self::Base(a) => a | (mux as u8 & 0x7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorIdentity {
    pub name: Name,
    pub address: SensorAddress,
}

impl SensorIdentity {
    pub fn sensor_type(&self) -> Result<SensorType, DecodeError> {
        SensorType::from_name(&self.name).ok_or(DecodeError::UnknownType)
    }
}

// ---------------------------------------------------------------------------
// Known sensor types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorType {
    Tmp275,
    Hdc1080,
    /// Pressure/temperature half of an MS8607.
    Ms8607Pt,
    /// Humidity half of an MS8607.
    Ms8607H,
}

impl SensorType {
    const TABLE: [(&'static str, SensorType); 4] = [
        ("TMP275", SensorType::Tmp275),
        ("HDC1080", SensorType::Hdc1080),
        ("MS8607PT", SensorType::Ms8607Pt),
        ("MS8607H", SensorType::Ms8607H),
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
    }

    pub fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, t)| *t == self)
            .map_or("?", |(n, _)| n)
    }

    pub fn capability(self) -> Capabilities {
        match self {
            Self::Tmp275 => Capabilities::TMP275,
            Self::Hdc1080 => Capabilities::HDC1080,
            Self::Ms8607Pt | Self::Ms8607H => Capabilities::MS8607,
        }
    }

    /// Address the device is wired to on the mux board.
    pub fn mounted_address(self) -> u8 {
        match self {
            Self::Tmp275 => addresses::MOUNTED_TMP275,
            Self::Hdc1080 | Self::Ms8607H => addresses::MOUNTED_HUMIDITY,
            Self::Ms8607Pt => addresses::MOUNTED_MS8607_PT,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// True if the assembly page was never programmed.
pub fn is_uninitialized(page: &[u8]) -> bool {
    matches!(page.first(), Some(&ERASED | &LEGACY_PLACEHOLDER))
}

/// Decode a NUL-terminated, NUL-filled name field.
///
/// Never reads past `NAME_LEN` bytes, even if `field` is longer.
pub fn decode_name(field: &[u8]) -> Result<Name, DecodeError> {
    let field = field.get(..NAME_LEN).ok_or(DecodeError::ShortPage)?;
    let end = field
        .iter()
        .position(|&b| b == 0)
        .ok_or(DecodeError::Unterminated)?;
    if field[end..].iter().any(|&b| b != 0) {
        return Err(DecodeError::TrailingBytes);
    }
    let bytes = &field[..end];
    if !bytes
        .iter()
        .all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
    {
        return Err(DecodeError::InvalidCharacter);
    }
    let mut name = Name::new();
    for &b in bytes {
        // end < NAME_LEN, so this always fits.
        let _ = name.push(b as char);
    }
    Ok(name)
}

pub fn decode_assembly(page: &[u8]) -> Result<AssemblyIdentity, DecodeError> {
    if page.len() < PAGE_SIZE {
        return Err(DecodeError::ShortPage);
    }
    let name = decode_name(page)?;
    let le32 = |off: usize| u32::from_le_bytes([page[off], page[off + 1], page[off + 2], page[off + 3]]);
    Ok(AssemblyIdentity {
        name,
        revision: Revision {
            major: page[OFF_REV_MAJOR],
            minor: page[OFF_REV_MINOR],
        },
        manufacture_date: le32(OFF_MANUFACTURED),
        service_date: le32(OFF_SERVICED),
    })
}

/// Decode a sensor-identity page. `Ok(None)` means the page is empty
/// (erased or zero-filled): there are no further sensor records.
pub fn decode_sensor(page: &[u8]) -> Result<Option<SensorIdentity>, DecodeError> {
    if page.len() < PAGE_SIZE {
        return Err(DecodeError::ShortPage);
    }
    if matches!(page[0], ERASED | 0x00) {
        return Ok(None);
    }
    Ok(Some(SensorIdentity {
        name: decode_name(page)?,
        address: SensorAddress::from_byte(page[OFF_SENSOR_ADDRESS]),
    }))
}

fn encode_name(page: &mut [u8; PAGE_SIZE], name: &str) {
    let len = name.len().min(NAME_LEN - 1);
    page[..len].copy_from_slice(&name.as_bytes()[..len]);
}

//! Unified error types for the sensor bus.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! discovery and scan loops' error handling uniform. All variants are
//! `Copy` so they can be passed through the engines without allocation.
//!
//! [`FaultKind`] is separate: it names the *reportable* fault categories
//! handed to the fault reporter, one bit each.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An I2C transaction failed.
    Bus(BusError),
    /// Identification-memory content could not be decoded.
    Decode(DecodeError),
    /// A device acknowledged but failed its device-specific setup.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Scan requested before discovery produced a topology.
    NotReady,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::NotReady => write!(f, "topology not discovered"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Address or data byte was not acknowledged.
    Nack,
    /// Another master won arbitration.
    ArbitrationLoss,
    /// Misplaced START/STOP or similar electrical fault.
    Bus,
    /// Receive buffer overrun.
    Overrun,
    /// Transport-specific failure (including timeout).
    Other,
}

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            ErrorKind::ArbitrationLoss => Self::ArbitrationLoss,
            ErrorKind::Bus => Self::Bus,
            ErrorKind::Overrun => Self::Overrun,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "no acknowledge"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Bus => write!(f, "bus error"),
            Self::Overrun => write!(f, "overrun"),
            Self::Other => write!(f, "transport error"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Name field has no NUL terminator within its 16-byte span.
    Unterminated,
    /// Non-NUL bytes follow the terminator inside the name span.
    TrailingBytes,
    /// Name contains bytes outside `A-Z`, `0-9` and `_`.
    InvalidCharacter,
    /// Name is well-formed but not in the known sensor-type table.
    UnknownType,
    /// Block shorter than one page.
    ShortPage,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unterminated => write!(f, "name not terminated"),
            Self::TrailingBytes => write!(f, "bytes after name terminator"),
            Self::InvalidCharacter => write!(f, "invalid character in name"),
            Self::UnknownType => write!(f, "unknown sensor type"),
            Self::ShortPage => write!(f, "short page"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Reportable faults
// ---------------------------------------------------------------------------

/// Fault categories surfaced to the fault reporter.
///
/// The reporter keeps at most one active report per kind, so kinds are
/// accumulated in a bitfield exactly like the discriminants below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FaultKind {
    /// A discovered port sensor failed to produce a reading.
    ExtSensorRead = 1 << 0,
    /// A multiplexer failed to switch to the requested port.
    MuxRouting = 1 << 1,
    /// The mux-mounted TMP275 failed to produce a reading.
    MountedTmp275Read = 1 << 2,
    /// The mux-mounted HDC1080 failed to produce a reading.
    MountedHdc1080Read = 1 << 3,
    /// The mux-mounted MS8607 failed to produce a reading.
    MountedMs8607Read = 1 << 4,
    /// Identification memory is erased or holds the legacy placeholder.
    IdMemoryUninitialized = 1 << 5,
    /// Identification memory holds a malformed or unknown record.
    IdMemoryDecode = 1 << 6,
    /// Identification memory acknowledged but a page read failed.
    IdMemoryRead = 1 << 7,
    /// A configured mounted sensor did not answer or failed to initialize.
    MountedSensorAbsent = 1 << 8,
    /// A different device answered at the expected mounted-sensor address.
    WrongDeviceAnswered = 1 << 9,
    /// Identification memory names two sensors that share a bus address.
    CapabilityConflict = 1 << 10,
}

impl FaultKind {
    pub const ALL: [FaultKind; 11] = [
        Self::ExtSensorRead,
        Self::MuxRouting,
        Self::MountedTmp275Read,
        Self::MountedHdc1080Read,
        Self::MountedMs8607Read,
        Self::IdMemoryUninitialized,
        Self::IdMemoryDecode,
        Self::IdMemoryRead,
        Self::MountedSensorAbsent,
        Self::WrongDeviceAnswered,
        Self::CapabilityConflict,
    ];

    /// Return the bitmask for this fault kind.
    pub const fn mask(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtSensorRead => write!(f, "external sensor read fault"),
            Self::MuxRouting => write!(f, "multiplexer fault"),
            Self::MountedTmp275Read => write!(f, "mounted TMP275 read fault"),
            Self::MountedHdc1080Read => write!(f, "mounted HDC1080 read fault"),
            Self::MountedMs8607Read => write!(f, "mounted MS8607 read fault"),
            Self::IdMemoryUninitialized => write!(f, "uninitialized identification memory"),
            Self::IdMemoryDecode => write!(f, "identification memory decode fault"),
            Self::IdMemoryRead => write!(f, "identification memory read fault"),
            Self::MountedSensorAbsent => write!(f, "mounted sensor absent"),
            Self::WrongDeviceAnswered => write!(f, "wrong device answered"),
            Self::CapabilityConflict => write!(f, "conflicting mounted sensors"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;

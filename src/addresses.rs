//! I2C address map and topology bounds for the external sensor network.
//!
//! Single source of truth: every driver and engine references this module
//! rather than hard-coding bus addresses. Addresses are always *derived*
//! from a per-device-class base and an array index; the bus only confirms
//! presence, it never supplies an address.

// ---------------------------------------------------------------------------
// Topology bounds
// ---------------------------------------------------------------------------

/// Habitat A (with endcap when attached) and habitat B.
pub const MAX_MUXES: usize = 2;
/// Sensor-carrying ports per multiplexer.
pub const MAX_PORTS: usize = 6;
/// One sensor per drawer compartment.
pub const MAX_SENSORS: usize = 3;

/// Port reserved for the sensors mounted on the mux board itself.
/// Lies outside `0..MAX_PORTS` and is never part of port enumeration.
pub const MOUNTED_PORT: u8 = 7;

// ---------------------------------------------------------------------------
// Per-class base addresses
// ---------------------------------------------------------------------------

/// PCA9548A lowest address (A2..A0 = 000).
pub const BASE_MUX: u8 = 0x70;
/// M24C32 identification memory lowest address.
pub const BASE_ID: u8 = 0x50;
/// TMP275 lowest address.
pub const BASE_SENSOR: u8 = 0x48;

// ---------------------------------------------------------------------------
// Mux-mounted devices (behind MOUNTED_PORT)
// ---------------------------------------------------------------------------

/// Mounted identification memory; all address pins strapped high.
pub const MOUNTED_ID: u8 = 0x57;
/// Mounted TMP275; all address pins strapped high.
pub const MOUNTED_TMP275: u8 = 0x4F;
/// HDC1080 and the MS8607 humidity half both answer here.
pub const MOUNTED_HUMIDITY: u8 = 0x40;
/// MS8607 pressure/temperature half. Only an MS8607 answers here.
pub const MOUNTED_MS8607_PT: u8 = 0x76;

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Bus address of multiplexer `m`.
pub const fn mux_address(m: usize) -> u8 {
    BASE_MUX | (m as u8 & 0x7)
}

/// Bus address of the identification memory on sensor board `s`.
pub const fn slot_id_address(s: usize) -> u8 {
    BASE_ID | (s as u8 & 0x7)
}

/// Bus address of the temperature sensor on sensor board `s`.
pub const fn slot_sensor_address(s: usize) -> u8 {
    BASE_SENSOR + (s as u8 & 0x7)
}

//! Fuzz target: identification-memory decoding
//!
//! Feeds arbitrary bytes to the page decoders as if they had been read
//! from a sensor board's memory. The decoders must never panic, and any
//! name they accept must be a short, printable identifier.
//!
//! cargo fuzz run fuzz_id_memory

#![no_main]

use libfuzzer_sys::fuzz_target;
use muxsense::identity::{self, NAME_LEN};

fuzz_target!(|data: &[u8]| {
    let _ = identity::is_uninitialized(data);

    if let Ok(assembly) = identity::decode_assembly(data) {
        assert!(assembly.name.len() < NAME_LEN);
    }

    // A memory holds one assembly page followed by sensor pages.
    for page in data.chunks(identity::PAGE_SIZE) {
        match identity::decode_sensor(page) {
            Ok(Some(rec)) => {
                assert!(rec.name.bytes().all(|b| b.is_ascii_graphic()));
                let _ = rec.sensor_type();
                let _ = rec.address.resolve(0);
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }

    if let Ok(name) = identity::decode_name(data) {
        assert!(!name.contains('\0'));
    }
});

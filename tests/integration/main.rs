//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the simulated I2C bus in `sim_bus`.  All tests run on the host
//! with no real hardware required.

mod scan_tests;
mod service_tests;

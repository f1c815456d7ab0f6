//! Application core: orchestration over the sensor engines, zero direct I/O.
//!
//! All interaction with the outside world happens through **port traits**
//! defined in [`ports`], keeping this layer testable on host against a
//! simulated bus.

pub mod events;
pub mod ports;
pub mod service;

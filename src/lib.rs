//! MuxSense library.
//!
//! Discovery and polling of sensors behind PCA9548A multiplexers. Every
//! hardware path is generic over the `embedded-hal` 1.0 traits, so the
//! whole crate runs on host against a simulated bus. The ESP-IDF binary
//! lives behind the `espidf` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod addresses;
pub mod app;
pub mod bus;
pub mod config;
pub mod discovery;
pub mod drivers;
pub mod error;
pub mod identity;
pub mod readings;
pub mod scan;
pub mod status;
pub mod topology;

pub use error::{Error, FaultKind, Result};

//! Device drivers for everything that lives on the external sensor bus.
//!
//! Every driver is built through a fallible constructor (`init`) that
//! performs the device-specific setup and only returns a handle on
//! success, so a half-initialized device is never observable. Drivers
//! hold no bus reference; each call borrows the [`Bus`](crate::bus::Bus).

pub mod hdc1080;
pub mod m24c32;
pub mod ms8607;
pub mod pca9548a;
pub mod tmp275;

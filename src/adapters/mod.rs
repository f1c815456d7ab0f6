//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `fault_log`    | FaultSink          | Bounded in-RAM fault log |
//! | `log_sink`     | EventSink          | Serial log output        |
//! |                | DisplaySink        | Serial log output        |
//! | `config_store` | ConfigPort         | postcard blob in memory  |

pub mod config_store;
pub mod fault_log;
pub mod log_sink;

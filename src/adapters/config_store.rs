//! In-memory configuration store.
//!
//! Persists [`SensorBusConfig`] as a postcard blob, the same encoding an
//! NVS-backed store writes on target. Validation happens before anything
//! is stored, so a blob in the store always decodes to a valid config.

use std::cell::RefCell;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SensorBusConfig;
use crate::error::Error;

#[derive(Debug, Default)]
pub struct MemConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blob (e.g. read from flash at boot).
    pub fn from_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: RefCell::new(Some(blob)),
        }
    }

    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.borrow().clone()
    }
}

impl ConfigPort for MemConfigStore {
    fn load(&self) -> Result<SensorBusConfig, ConfigError> {
        let blob = self.blob.borrow();
        let Some(bytes) = blob.as_deref() else {
            info!("config: none stored, using defaults");
            return Ok(SensorBusConfig::default());
        };
        let config: SensorBusConfig = postcard::from_bytes(bytes).map_err(|_| {
            warn!("config: stored blob does not decode");
            ConfigError::Corrupted
        })?;
        config.validate().map_err(to_config_error)?;
        Ok(config)
    }

    fn save(&self, config: &SensorBusConfig) -> Result<(), ConfigError> {
        config.validate().map_err(to_config_error)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        info!("config: saved ({} bytes)", bytes.len());
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}

fn to_config_error(e: Error) -> ConfigError {
    match e {
        Error::Config(msg) => ConfigError::ValidationFailed(msg),
        _ => ConfigError::Corrupted,
    }
}

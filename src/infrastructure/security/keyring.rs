use crate::domain::error::{AppError, Result};
use keyring::Entry;

pub struct KeyringManager {
    service: String,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    /// `Ok(None)` when no credential is stored under `key`.
    pub fn get_secret(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, key)
            .map_err(|e| AppError::ConfigError(format!("Failed to open keyring entry: {}", e)))?;

        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::ConfigError(format!(
                "Failed to read keyring entry: {}",
                e
            ))),
        }
    }
}

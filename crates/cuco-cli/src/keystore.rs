//! Device key store.
//!
//! A JSON object keyed by device serial number:
//!
//! ```json
//! {
//!   "8A1054AAC0A0D77CEB6883EF0FC1C515": {
//!     "Address": "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515",
//!     "AK": "4E8ADD61E02DCD2FDAD9457D9738E370",
//!     "UK": "2A6BCC61D12DCD2FDAD9457D9738E421"
//!   }
//! }
//! ```
//!
//! `Address` may be missing, in which case it has to be supplied when a
//! ticket is issued.

use anyhow::{Context, Result};
use cuco_core::DeviceKeys;
use std::{collections::HashMap, fs, path::Path};
use tracing::debug;

/// Read-only serial → keys lookup.
#[derive(Debug, Default)]
pub struct KeyStore {
    entries: HashMap<String, DeviceKeys>,
}

impl KeyStore {
    /// Read and parse the key store file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read key store {}", path.display()))?;
        let store = Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse key store {}", path.display()))?;
        debug!(devices = store.len(), "key store loaded");
        Ok(store)
    }

    /// Parse a key store document; serials are normalized to uppercase.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, DeviceKeys> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(serial, keys)| (normalize(&serial), keys))
            .collect();
        Ok(KeyStore { entries })
    }

    /// Keys for a serial number; case-insensitive.
    pub fn get(&self, serial: &str) -> Option<&DeviceKeys> {
        self.entries.get(&normalize(serial))
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn normalize(serial: &str) -> String {
    serial.trim().to_ascii_uppercase()
}

//! Issuer configuration file.
//!
//! ```json
//! {
//!   "defaults": { "IT": "Welcome", "ticketlifetime": 86400, "MaxUC": "64" },
//!   "key_store": "auth-keys.json"
//! }
//! ```
//!
//! A relative `key_store` path is taken relative to the configuration file.

use anyhow::{Context, Result};
use cuco_ticket::Defaults;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Startup configuration, read once.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuerConfig {
    /// Fallback values for optional ticket fields.
    #[serde(default)]
    pub defaults: Defaults,

    /// Path of the device key store.
    pub key_store: PathBuf,
}

impl IssuerConfig {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        if config.key_store.is_relative()
            && let Some(dir) = path.parent()
        {
            config.key_store = dir.join(&config.key_store);
        }

        debug!(
            defaults = config.defaults.len(),
            key_store = %config.key_store.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse a configuration document without resolving `key_store`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{VaultError, VaultResult};

/// Top-level configuration (loaded from maskstore.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub storage: StorageConfig,
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3-compatible endpoint of the pinning service
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket holding encrypted frames
    pub bucket: String,
    /// Object key prefix inside the bucket
    pub prefix: String,
    /// Enforce HTTPS for store connections
    pub enforce_tls: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: "us-east-1".into(),
            bucket: "maskstore".into(),
            prefix: "maskstore".into(),
            enforce_tls: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Path of the local durable state file (key material, flags, ledger)
    pub state_file: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("maskstore-state.json"),
        }
    }
}

impl MaskConfig {
    /// Load configuration from a TOML file. A missing file yields defaults,
    /// so first-run works without any setup.
    pub fn load(path: &Path) -> VaultResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| VaultError::Config(format!("parsing {}: {e}", path.display())))
    }
}

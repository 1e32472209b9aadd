pub mod device_config;
pub mod discovery_config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::device_config::DeviceConfig;
use crate::config::discovery_config::{BeaconConfig, DiscoveryConfig};
use crate::utils::{ensure_directory_exists, is_valid_address};

const CONFIG_DIR_NAME: &str = "door-ble-bridge";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub discovery: DiscoveryConfig,
    pub beacon: BeaconConfig,
}

impl AppConfig {
    /// `<config dir>/door-ble-bridge/config.json`, or the working directory
    /// when the platform has no config dir
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .unwrap_or_default()
            .join(CONFIG_FILE_NAME)
    }

    /// Loads the config from `path`, falling back to defaults if the file is missing.
    pub async fn load_config(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file not found at {:?}, using default.", path);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Config loaded from {:?}", path);
        Ok(config)
    }

    /// Saves the config to `path`, creating the parent directory if needed.
    pub async fn save_config(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_directory_exists(parent).await?;
        }

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(path, config_json).await?;

        info!("Config saved to {:?}.", path);
        Ok(())
    }

    /// Rejects values the workflows cannot run with
    pub fn validate(&self) -> Result<()> {
        if !is_valid_address(&self.device.address) {
            bail!(
                "Invalid device address {:?}, expected XX:XX:XX:XX:XX:XX in upper case",
                self.device.address
            );
        }
        if self.discovery.max_attempts == 0 {
            bail!("discovery.max_attempts must be at least 1");
        }
        if self.beacon.poll_interval_ms == 0 {
            bail!("beacon.poll_interval_ms must be greater than 0");
        }
        Ok(())
    }
}

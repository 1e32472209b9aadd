use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use log::{error, info};
use regex::Regex;
use tokio::fs;

static MAC_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").expect("valid MAC pattern"));

static MAC_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9A-F]{2}:){5}[0-9A-F]{2}$").expect("valid MAC pattern"));

/// Asynchronously ensures that a directory exists, creating it if it does not.
/// This function is idempotent.
pub async fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        if let Err(e) = fs::create_dir_all(path).await {
            error!("Failed to create directory at {:?}: {}", path, e);
            return Err(e.into());
        }
        info!("Created directory at: {:?}", path);
    }
    Ok(())
}

/// Pulls the last MAC address out of a platform device id, uppercased
pub fn extract_mac_address(device_id_str: &str) -> Option<String> {
    MAC_IN_TEXT
        .find_iter(device_id_str)
        .last()
        .map(|m| m.as_str().replace('-', ":").to_uppercase())
}

/// Whether `address` is in the `XX:XX:XX:XX:XX:XX` upper-case form the stack reports
pub fn is_valid_address(address: &str) -> bool {
    MAC_EXACT.is_match(address)
}

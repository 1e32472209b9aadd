use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::bluetooth::{
    DISCOVERY_RETRY_DELAY_MS, MAX_DISCOVERY_ATTEMPTS, POLL_INTERVAL_MS, RetryPolicy,
    SCAN_TIMEOUT_SECS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Attempts for the device and service lookups
    pub max_attempts: u32,

    /// Pause between two attempts
    pub retry_delay_ms: u64,

    /// Upper bound for the beacon mode's single find
    pub scan_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            max_attempts: MAX_DISCOVERY_ATTEMPTS,
            retry_delay_ms: DISCOVERY_RETRY_DELAY_MS,
            scan_timeout_secs: SCAN_TIMEOUT_SECS,
        }
    }
}

impl DiscoveryConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay_ms: self.retry_delay_ms,
        }
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Time between two manufacturer data reads
    pub poll_interval_ms: u64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        BeaconConfig {
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

impl BeaconConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

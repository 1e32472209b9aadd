//! Error taxonomy for the Bluetooth workflows

use thiserror::Error;
use uuid::Uuid;

/// Errors reported by device acquisition, GATT setup and advertisement polling
#[derive(Debug, Error)]
pub enum BleError {
    #[error("No Bluetooth adapter found")]
    AdapterUnavailable,

    #[error("Discovery could not be started: {0}")]
    DiscoveryStartFailed(String),

    #[error("Discovery could not be stopped: {0}")]
    DiscoveryStopFailed(String),

    #[error("No sensor found with the provided address {address}")]
    DeviceNotFound { address: String },

    #[error("Could not connect device {address}: {reason}")]
    ConnectFailed { address: String, reason: String },

    #[error("Device does not expose the service {uuid}")]
    ServiceNotFound { uuid: Uuid },

    #[error("Could not find characteristic {uuid}")]
    CharacteristicNotFound { uuid: Uuid },

    #[error("Could not subscribe to notifications on {uuid}: {reason}")]
    SubscribeFailed { uuid: String, reason: String },

    #[error("Could not disconnect device {address}: {reason}")]
    DisconnectFailed { address: String, reason: String },

    #[error(transparent)]
    Stack(#[from] bluest::Error),
}

impl BleError {
    /// Whether the error means the target device was never located
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }
}

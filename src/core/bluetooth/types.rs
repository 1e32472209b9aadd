//! Defines shared data structures for the Bluetooth module.

use std::collections::BTreeMap;
use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::stack::BleDevice;

/// Manufacturer data entries keyed by company id
pub type ManufacturerData = BTreeMap<u16, Vec<u8>>;

/// Callback invoked with every notification payload
pub type NotifyCallback = Box<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

/// Snapshot of a device used for the "Found device" log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    /// The hardware address of the device
    pub address: String,
    /// The name of the device, if available
    pub name: Option<String>,
    /// Whether the device is connected
    pub is_connected: bool,
}

impl DeviceSummary {
    pub async fn of<D: BleDevice>(device: &D) -> Self {
        Self {
            address: device.address(),
            name: device.name(),
            is_connected: device.is_connected().await,
        }
    }
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Address = {} Name = {} Connected = {}",
            self.address,
            self.name.as_deref().unwrap_or("Unknown"),
            self.is_connected
        )
    }
}

/// Handle to an active notification subscription.
/// Cancelling it stops the delivery task; dropping it does not.
#[derive(Debug, Clone)]
pub struct Subscription {
    uuid: String,
    cancel_token: CancellationToken,
}

impl Subscription {
    pub fn new(uuid: String, cancel_token: CancellationToken) -> Self {
        Self { uuid, cancel_token }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.cancel_token.is_cancelled()
    }
}

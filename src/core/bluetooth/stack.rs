//! Abstraction over the host Bluetooth stack
//! The workflows only talk to these traits, so the real `bluest` backend and
//! the in-memory test stack are interchangeable.

use std::time::Duration;

use async_trait::async_trait;

use crate::core::bluetooth::error::BleError;
use crate::core::bluetooth::types::{ManufacturerData, NotifyCallback, Subscription};

/// Process-wide handle to the BLE radio
#[async_trait]
pub trait BleAdapter: Send + Sync + 'static {
    type Device: BleDevice;

    /// Start a discovery scan. Calling it while a scan is running is a no-op.
    async fn start_scan(&self) -> Result<(), BleError>;

    /// Stop the running discovery scan
    async fn stop_scan(&self) -> Result<(), BleError>;

    /// Devices currently visible to the adapter, `None` if the list is unavailable
    async fn visible_devices(&self) -> Option<Vec<Self::Device>>;

    /// Wait up to `timeout` for a device with the given address to show up
    async fn find_device(&self, address: &str, timeout: Duration) -> Option<Self::Device>;
}

/// One BLE peripheral
#[async_trait]
pub trait BleDevice: Clone + Send + Sync + 'static {
    type Service: BleService;

    fn address(&self) -> String;

    fn name(&self) -> Option<String>;

    async fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<(), BleError>;

    async fn disconnect(&self) -> Result<(), BleError>;

    /// Services exposed by the device, `None` if they are not available yet
    async fn services(&self) -> Option<Vec<Self::Service>>;

    /// Latest manufacturer data seen for the device, keyed by company id
    async fn manufacturer_data(&self) -> ManufacturerData;
}

/// One GATT service
#[async_trait]
pub trait BleService: Clone + Send + Sync + 'static {
    type Characteristic: BleCharacteristic;

    fn uuid(&self) -> String;

    async fn characteristics(&self) -> Option<Vec<Self::Characteristic>>;
}

/// One GATT characteristic
#[async_trait]
pub trait BleCharacteristic: Clone + Send + Sync + 'static {
    fn uuid(&self) -> String;

    /// Attach `callback` to value-change notifications.
    /// The callback is invoked from the stack's delivery task.
    async fn subscribe(&self, callback: NotifyCallback) -> Result<Subscription, BleError>;
}

//! Bluetooth functionality for the door sensor bridge
//! This module handles discovery, the GATT notification client and the
//! advertisement poller, all on top of the stack traits in `stack`.

mod adapter;
mod advertisement;
mod connection;
mod constants;
mod error;
#[cfg(test)]
pub(crate) mod fake;
mod manager;
mod notification;
mod retry;
mod scanner;
mod stack;
mod types;

// Re-export types that should be publicly accessible
pub use adapter::{BluestAdapter, BluestCharacteristic, BluestDevice, BluestService};
pub use advertisement::{AdvertisementPoller, PollSettings, PollSummary, describe_manufacturer_data};
pub use connection::{GattNotificationClient, GattTarget, find_first_match, find_last_match, uuid_matches};
pub use constants::*; // Re-export all constants
pub use error::BleError;
pub use manager::BluetoothManager;
pub use notification::{NotificationHandler, decode_payload};
pub use retry::{Attempt, RetryPolicy, retry_until};
pub use scanner::{DeviceLocator, stop_discovery};
pub use stack::{BleAdapter, BleCharacteristic, BleDevice, BleService};
pub use types::{DeviceSummary, ManufacturerData, NotifyCallback, Subscription};

//! Bluetooth manager for the door sensor bridge
//! This module provides the start/stop lifecycle hooks around the locator
//! and the GATT notification client

use std::sync::Arc;

use log::{error, info};

use crate::config::AppConfig;
use crate::core::bluetooth::advertisement::{AdvertisementPoller, PollSettings};
use crate::core::bluetooth::connection::{GattNotificationClient, GattTarget};
use crate::core::bluetooth::error::BleError;
use crate::core::bluetooth::scanner::DeviceLocator;
use crate::core::bluetooth::stack::{BleAdapter, BleDevice};
use crate::core::bluetooth::types::{DeviceSummary, NotifyCallback};
use crate::core::shutdown::ShutdownLatch;

/// Manages Bluetooth operations
pub struct BluetoothManager<A: BleAdapter> {
    config: AppConfig,
    /// Device locator sharing the injected adapter
    locator: DeviceLocator<A>,
    /// GATT notification client
    client: GattNotificationClient<A>,
}

impl<A: BleAdapter> BluetoothManager<A> {
    pub fn new(adapter: Arc<A>, config: AppConfig) -> Self {
        let policy = config.discovery.retry_policy();
        let locator = DeviceLocator::new(adapter.clone(), policy);
        let client = GattNotificationClient::new(adapter, policy);
        Self {
            config,
            locator,
            client,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start hook: locate the sensor, connect and subscribe `on_notify`
    pub async fn start(&mut self, on_notify: NotifyCallback) -> Result<(), BleError> {
        info!("----------------  DOOR BLE STARTED ------------------");
        let address = self.config.device.address.clone();

        let found = self.locator.find_device_by_address(&address).await;
        self.locator.stop_discovery().await;

        let device = match found {
            Ok(device) => device,
            Err(e) => {
                error!("No sensor found with the provided address.");
                return Err(e);
            }
        };
        info!("Found device: {}", DeviceSummary::of(&device).await);

        let target = GattTarget::from(&self.config.device);
        if let Err(e) = self.client.attach(device, &target, on_notify).await {
            error!("{}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Stop hook: drop the subscription and disconnect
    pub async fn stop(&mut self) -> Result<(), BleError> {
        info!("Stop and disconnect");
        self.client.detach().await
    }

    /// Whether the held device is still connected
    pub async fn is_connected(&self) -> bool {
        match self.client.device() {
            Some(device) => device.is_connected().await,
            None => false,
        }
    }

    /// Builds the beacon-mode poller on the same adapter
    pub fn poller(&self, latch: ShutdownLatch) -> AdvertisementPoller<A> {
        let settings = PollSettings {
            scan_timeout: self.config.discovery.scan_timeout(),
            poll_interval: self.config.beacon.poll_interval(),
        };
        AdvertisementPoller::new(self.locator.clone(), latch, settings)
    }
}

//! Beacon mode: reads the sensor's manufacturer data without a GATT connection

use std::time::Duration;

use log::{error, info};

use crate::core::bluetooth::error::BleError;
use crate::core::bluetooth::notification::decode_payload;
use crate::core::bluetooth::scanner::DeviceLocator;
use crate::core::bluetooth::stack::{BleAdapter, BleDevice};
use crate::core::bluetooth::types::{DeviceSummary, ManufacturerData};
use crate::core::shutdown::ShutdownLatch;

/// How long to look for the device and how often to read its advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub scan_timeout: Duration,
    pub poll_interval: Duration,
}

/// What a finished poll loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub reads: u64,
}

/// Log lines for one manufacturer data snapshot
pub fn describe_manufacturer_data(data: &ManufacturerData) -> Vec<String> {
    data.values()
        .flat_map(|bytes| [format!("SIZE: {} bytes", bytes.len()), decode_payload(bytes)])
        .collect()
}

/// Polls a device's advertisement until the latch is signalled
pub struct AdvertisementPoller<A: BleAdapter> {
    locator: DeviceLocator<A>,
    latch: ShutdownLatch,
    settings: PollSettings,
}

impl<A: BleAdapter> AdvertisementPoller<A> {
    pub fn new(locator: DeviceLocator<A>, latch: ShutdownLatch, settings: PollSettings) -> Self {
        Self {
            locator,
            latch,
            settings,
        }
    }

    /// Finds `address` and logs its manufacturer data every poll interval.
    ///
    /// Returns `DeviceNotFound` if the device does not show up within the
    /// scan timeout; the caller decides how the process exits.
    pub async fn run(&self, address: &str) -> Result<PollSummary, BleError> {
        info!("----------------  DOOR BLE BEACON STARTED ------------------");
        self.locator.start_discovery().await;

        let device = match self
            .locator
            .find_device_blocking(address, self.settings.scan_timeout)
            .await
        {
            Ok(device) => device,
            Err(e) => {
                error!("No sensor found with the provided address.");
                self.locator.stop_discovery().await;
                return Err(e);
            }
        };
        info!("Found device: {}", DeviceSummary::of(&device).await);

        let mut reads = 0;
        while self.latch.is_running() {
            let data = device.manufacturer_data().await;
            reads += 1;
            for line in describe_manufacturer_data(&data) {
                info!("{}", line);
            }
            self.latch.await_tick(self.settings.poll_interval).await;
        }

        if let Err(e) = device.disconnect().await {
            error!("Failed to disconnect {}: {}", address, e);
        }
        self.locator.stop_discovery().await;
        info!("disconnected");

        Ok(PollSummary { reads })
    }
}

//! Device discovery by hardware address

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::core::bluetooth::error::BleError;
use crate::core::bluetooth::retry::{Attempt, RetryPolicy, retry_until};
use crate::core::bluetooth::stack::{BleAdapter, BleDevice};

/// Finds one device by its hardware address
pub struct DeviceLocator<A: BleAdapter> {
    adapter: Arc<A>,
    policy: RetryPolicy,
}

impl<A: BleAdapter> Clone for DeviceLocator<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            policy: self.policy,
        }
    }
}

impl<A: BleAdapter> DeviceLocator<A> {
    pub fn new(adapter: Arc<A>, policy: RetryPolicy) -> Self {
        Self { adapter, policy }
    }

    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    /// Starts discovery; a failure is logged and discovery continues without it
    pub async fn start_discovery(&self) -> bool {
        match self.adapter.start_scan().await {
            Ok(()) => {
                info!("Discovery started");
                true
            }
            Err(e) => {
                error!("Discovery could not be started: {}", e);
                false
            }
        }
    }

    /// Stops discovery, swallowing any failure
    pub async fn stop_discovery(&self) {
        stop_discovery(self.adapter.as_ref()).await;
    }

    /// Polls the visible-device list until `address` shows up.
    ///
    /// An unavailable list ends the search at once. A list without the
    /// address is retried after the policy delay.
    pub async fn find_device_by_address(&self, address: &str) -> Result<A::Device, BleError> {
        self.start_discovery().await;

        let adapter = self.adapter.as_ref();
        let found = retry_until(&self.policy, "device", move |attempt| async move {
            info!("..");
            let Some(devices) = adapter.visible_devices().await else {
                warn!("Visible device list is unavailable");
                return Attempt::Abort;
            };
            debug!("Attempt {}: {} visible devices", attempt, devices.len());
            match devices.into_iter().find(|device| device.address() == address) {
                Some(device) => Attempt::Done(device),
                None => Attempt::Retry,
            }
        })
        .await;

        found.ok_or_else(|| BleError::DeviceNotFound {
            address: address.to_string(),
        })
    }

    /// Single bounded wait on the stack's own find primitive
    pub async fn find_device_blocking(
        &self,
        address: &str,
        timeout: Duration,
    ) -> Result<A::Device, BleError> {
        info!("Waiting up to {:?} for device {}", timeout, address);
        self.adapter
            .find_device(address, timeout)
            .await
            .ok_or_else(|| BleError::DeviceNotFound {
                address: address.to_string(),
            })
    }
}

/// Best-effort stop of a running discovery scan
pub async fn stop_discovery<A: BleAdapter + ?Sized>(adapter: &A) {
    match adapter.stop_scan().await {
        Ok(()) => debug!("Discovery stopped"),
        Err(e) => error!("Discovery could not be stopped: {}", e),
    }
}

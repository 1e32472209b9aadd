//! GATT connection handling for the door sensor
//! This module connects to the sensor, finds its service and characteristics
//! and subscribes to value-change notifications

use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::core::bluetooth::error::BleError;
use crate::core::bluetooth::retry::{Attempt, RetryPolicy, retry_until};
use crate::core::bluetooth::scanner::stop_discovery;
use crate::core::bluetooth::stack::{BleAdapter, BleCharacteristic, BleDevice, BleService};
use crate::core::bluetooth::types::{DeviceSummary, NotifyCallback, Subscription};

/// The service and characteristics the client looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattTarget {
    pub service: Uuid,
    pub value_char: Uuid,
    pub period_char: Uuid,
}

/// Case-insensitive UUID comparison against the string form reported by the stack
pub fn uuid_matches(candidate: &str, target: &Uuid) -> bool {
    let candidate = candidate.trim();
    match Uuid::parse_str(candidate) {
        Ok(parsed) => parsed == *target,
        Err(_) => candidate.eq_ignore_ascii_case(&target.hyphenated().to_string()),
    }
}

/// Picks the last item whose UUID matches `target`, logging every UUID seen
pub fn find_last_match<T, F>(items: &[T], target: &Uuid, uuid_of: F) -> Option<T>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    let mut found = None;
    for item in items {
        let uuid = uuid_of(item);
        info!("UUID: {}", uuid);
        if uuid_matches(&uuid, target) {
            found = Some(item.clone());
        }
    }
    found
}

/// Picks the first item whose UUID matches `target`, logging every UUID seen
pub fn find_first_match<T, F>(items: &[T], target: &Uuid, uuid_of: F) -> Option<T>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    items
        .iter()
        .find(|item| {
            let uuid = uuid_of(item);
            info!("UUID: {}", uuid);
            uuid_matches(&uuid, target)
        })
        .cloned()
}

/// Connects to a device and keeps its notification subscription alive
pub struct GattNotificationClient<A: BleAdapter> {
    adapter: Arc<A>,
    policy: RetryPolicy,
    device: Option<A::Device>,
    subscription: Option<Subscription>,
}

impl<A: BleAdapter> GattNotificationClient<A> {
    pub fn new(adapter: Arc<A>, policy: RetryPolicy) -> Self {
        Self {
            adapter,
            policy,
            device: None,
            subscription: None,
        }
    }

    pub fn device(&self) -> Option<&A::Device> {
        self.device.as_ref()
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    /// Connects to `device`, locates `target` and subscribes `on_notify`
    /// to the period characteristic.
    ///
    /// The device is held from the moment it is handed over, so `detach`
    /// disconnects it even when a later step fails.
    pub async fn attach(
        &mut self,
        device: A::Device,
        target: &GattTarget,
        on_notify: NotifyCallback,
    ) -> Result<(), BleError> {
        self.device = Some(device.clone());

        if let Err(e) = device.connect().await {
            warn!("Could not connect device.");
            return Err(match e {
                BleError::ConnectFailed { .. } => e,
                other => BleError::ConnectFailed {
                    address: device.address(),
                    reason: other.to_string(),
                },
            });
        }
        info!("Sensor with the provided address connected");

        let service = self.find_service(&device, &target.service).await?;
        info!("Found service {}", service.uuid());

        info!("Characteristics exposed by service:");
        let characteristics = match service.characteristics().await {
            Some(characteristics) => characteristics,
            None => {
                info!("No Characteristics found!");
                Vec::new()
            }
        };

        let value_char = find_first_match(&characteristics, &target.value_char, |c| c.uuid());
        let period_char = find_first_match(&characteristics, &target.period_char, |c| c.uuid());
        let period_char = match (value_char, period_char) {
            (Some(_), Some(period_char)) => period_char,
            (value_char, _) => {
                warn!("Could not find the correct characteristics.");
                let missing = if value_char.is_none() { target.value_char } else { target.period_char };
                return Err(BleError::CharacteristicNotFound { uuid: missing });
            }
        };
        info!("Found the door ble characteristics");

        // Notifications come from the period characteristic, not the value one.
        let subscription = period_char.subscribe(on_notify).await?;
        info!("Subscribed to notifications on {}", subscription.uuid());
        self.subscription = Some(subscription);

        stop_discovery(self.adapter.as_ref()).await;
        Ok(())
    }

    async fn find_service(
        &self,
        device: &A::Device,
        service_uuid: &Uuid,
    ) -> Result<<A::Device as BleDevice>::Service, BleError> {
        let found = retry_until(&self.policy, "service", move |_| async move {
            info!("Services exposed by device:");
            match device.services().await {
                Some(services) if !services.is_empty() => {
                    match find_last_match(&services, service_uuid, |s| s.uuid()) {
                        Some(service) => Attempt::Done(service),
                        None => Attempt::Retry,
                    }
                }
                _ => {
                    info!("No Services found!");
                    Attempt::Retry
                }
            }
        })
        .await;

        found.ok_or_else(|| {
            warn!("This device does not have the door ble sensor service we are looking for.");
            BleError::ServiceNotFound { uuid: *service_uuid }
        })
    }

    /// Cancels the subscription and disconnects the held device, if any
    pub async fn detach(&mut self) -> Result<(), BleError> {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        let Some(device) = self.device.take() else {
            info!("No device held, nothing to disconnect");
            return Ok(());
        };

        info!("Disconnecting from device {}", DeviceSummary::of(&device).await);
        device.disconnect().await?;
        info!("Successfully disconnected");
        Ok(())
    }
}

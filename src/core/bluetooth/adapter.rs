//! `bluest` implementation of the Bluetooth stack traits
//! A background scan task keeps a cache of advertising devices keyed by MAC
//! address, together with the latest manufacturer data each one broadcast.

use std::collections::HashMap;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, Device, Service};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::error::BleError;
use crate::core::bluetooth::notification::NotificationHandler;
use crate::core::bluetooth::stack::{BleAdapter, BleCharacteristic, BleDevice, BleService};
use crate::core::bluetooth::types::{ManufacturerData, NotifyCallback, Subscription};
use crate::utils::extract_mac_address;

struct SeenDevice {
    device: Device,
    manufacturer_data: ManufacturerData,
}

type DeviceCache = Arc<Mutex<HashMap<String, SeenDevice>>>;

fn lock_cache(devices: &DeviceCache) -> MutexGuard<'_, HashMap<String, SeenDevice>> {
    devices.lock().unwrap_or_else(PoisonError::into_inner)
}

/// MAC address of a device, falling back to the platform id when none is embedded
fn device_address(device: &Device) -> String {
    let id = device.id().to_string();
    extract_mac_address(&id).unwrap_or(id)
}

struct ScanTask {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Host adapter backed by `bluest`
#[derive(Clone)]
pub struct BluestAdapter {
    adapter: Adapter,
    devices: DeviceCache,
    updated: Arc<Notify>,
    scan_task: Arc<tokio::sync::Mutex<Option<ScanTask>>>,
}

impl BluestAdapter {
    /// Opens the default adapter and waits until it is powered on
    pub async fn new() -> Result<Self, BleError> {
        let adapter = Adapter::default()
            .await
            .ok_or(BleError::AdapterUnavailable)?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");

        Ok(Self {
            adapter,
            devices: Arc::new(Mutex::new(HashMap::new())),
            updated: Arc::new(Notify::new()),
            scan_task: Arc::new(tokio::sync::Mutex::new(None)),
        })
    }

    fn wrap(&self, device: Device, address: String) -> BluestDevice {
        BluestDevice {
            adapter: self.adapter.clone(),
            device,
            address,
            devices: self.devices.clone(),
        }
    }

    fn lookup(&self, address: &str) -> Option<BluestDevice> {
        let device = lock_cache(&self.devices).get(address).map(|seen| seen.device.clone())?;
        Some(self.wrap(device, address.to_string()))
    }

    fn remember(devices: &DeviceCache, device: Device, manufacturer_data: Option<bluest::ManufacturerData>) {
        let address = device_address(&device);
        let mut devices = lock_cache(devices);
        let seen = devices.entry(address).or_insert_with(|| SeenDevice {
            device: device.clone(),
            manufacturer_data: ManufacturerData::new(),
        });
        seen.device = device;
        if let Some(data) = manufacturer_data {
            seen.manufacturer_data.insert(data.company_id, data.data.to_vec());
        }
    }

    async fn internal_scan_task(
        adapter: Adapter,
        devices: DeviceCache,
        updated: Arc<Notify>,
        cancel_token: CancellationToken,
        ready: oneshot::Sender<Result<(), bluest::Error>>,
    ) {
        // connected devices do not advertise, pick them up first
        info!("Checking for connected devices");
        match adapter.connected_devices().await {
            Ok(connected) => {
                for device in connected {
                    Self::remember(&devices, device, None);
                }
            }
            Err(e) => warn!("Could not list connected devices: {}", e),
        }

        info!("Starting bluetooth scan");
        let scan_stream = match adapter.scan(&[]).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));
        updated.notify_waiters();

        let mut scan_stream = pin!(scan_stream);
        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            debug!(
                                "Found device - Device: {:?}, RSSI: {:?}",
                                discovered_device.device, discovered_device.rssi
                            );
                            Self::remember(
                                &devices,
                                discovered_device.device,
                                discovered_device.adv_data.manufacturer_data,
                            );
                            updated.notify_waiters();
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
        info!("Bluetooth scan stopped.");
    }
}

#[async_trait]
impl BleAdapter for BluestAdapter {
    type Device = BluestDevice;

    async fn start_scan(&self) -> Result<(), BleError> {
        let mut scan_task = self.scan_task.lock().await;
        if scan_task.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            debug!("Discovery already running");
            return Ok(());
        }

        let cancel_token = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = tokio::spawn(Self::internal_scan_task(
            self.adapter.clone(),
            self.devices.clone(),
            self.updated.clone(),
            cancel_token.clone(),
            ready_tx,
        ));

        match ready_rx.await {
            Ok(Ok(())) => {
                *scan_task = Some(ScanTask {
                    cancel_token,
                    handle,
                });
                info!("Device scan task started.");
                Ok(())
            }
            Ok(Err(e)) => Err(BleError::DiscoveryStartFailed(e.to_string())),
            Err(_) => Err(BleError::DiscoveryStartFailed(
                "scan task ended before the scan started".to_string(),
            )),
        }
    }

    async fn stop_scan(&self) -> Result<(), BleError> {
        let Some(task) = self.scan_task.lock().await.take() else {
            debug!("No active scan task to stop.");
            return Ok(());
        };

        info!("Stopping Bluetooth scan.");
        task.cancel_token.cancel();
        task.handle.await.map_err(|e| {
            error!("Scan task finished with an unexpected join error: {:?}", e);
            BleError::DiscoveryStopFailed(e.to_string())
        })
    }

    async fn visible_devices(&self) -> Option<Vec<BluestDevice>> {
        let scanning = self.scan_task.lock().await.is_some();
        let snapshot: Vec<(String, Device)> = {
            let devices = lock_cache(&self.devices);
            if !scanning && devices.is_empty() {
                return None;
            }
            devices
                .iter()
                .map(|(address, seen)| (address.clone(), seen.device.clone()))
                .collect()
        };
        Some(
            snapshot
                .into_iter()
                .map(|(address, device)| self.wrap(device, address))
                .collect(),
        )
    }

    async fn find_device(&self, address: &str, timeout: Duration) -> Option<BluestDevice> {
        if let Err(e) = self.start_scan().await {
            error!("{}", e);
            return None;
        }

        let wait = async {
            loop {
                let mut notified = pin!(self.updated.notified());
                notified.as_mut().enable();
                if let Some(device) = self.lookup(address) {
                    return device;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.ok()
    }
}

/// A device seen by `BluestAdapter`
#[derive(Clone)]
pub struct BluestDevice {
    adapter: Adapter,
    device: Device,
    address: String,
    devices: DeviceCache,
}

#[async_trait]
impl BleDevice for BluestDevice {
    type Service = BluestService;

    fn address(&self) -> String {
        self.address.clone()
    }

    fn name(&self) -> Option<String> {
        self.device.name().ok()
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn connect(&self) -> Result<(), BleError> {
        if self.device.is_connected().await {
            return Ok(());
        }
        info!("Initiating connection to {}...", self.address);
        self.adapter
            .connect_device(&self.device)
            .await
            .map_err(|e| BleError::ConnectFailed {
                address: self.address.clone(),
                reason: e.to_string(),
            })
    }

    async fn disconnect(&self) -> Result<(), BleError> {
        if !self.device.is_connected().await {
            info!("Device {} not connected", self.address);
            return Ok(());
        }
        self.adapter
            .disconnect_device(&self.device)
            .await
            .map_err(|e| BleError::DisconnectFailed {
                address: self.address.clone(),
                reason: e.to_string(),
            })
    }

    async fn services(&self) -> Option<Vec<BluestService>> {
        match self.device.services().await {
            Ok(services) => Some(services.into_iter().map(BluestService).collect()),
            Err(e) => {
                warn!("Service discovery failed: {}", e);
                None
            }
        }
    }

    async fn manufacturer_data(&self) -> ManufacturerData {
        lock_cache(&self.devices)
            .get(&self.address)
            .map(|seen| seen.manufacturer_data.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct BluestService(Service);

#[async_trait]
impl BleService for BluestService {
    type Characteristic = BluestCharacteristic;

    fn uuid(&self) -> String {
        self.0.uuid().to_string()
    }

    async fn characteristics(&self) -> Option<Vec<BluestCharacteristic>> {
        match self.0.characteristics().await {
            Ok(characteristics) => Some(characteristics.into_iter().map(BluestCharacteristic).collect()),
            Err(e) => {
                warn!("Characteristic discovery failed: {}", e);
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct BluestCharacteristic(Characteristic);

impl BluestCharacteristic {
    async fn process_notifications(
        characteristic: Characteristic,
        callback: NotifyCallback,
        cancel_token: CancellationToken,
        ready: oneshot::Sender<Result<(), bluest::Error>>,
    ) {
        let notification_stream = match characteristic.notify().await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));
        info!("Listening for sensor notifications...");

        let mut notification_stream = pin!(notification_stream);
        loop {
            tokio::select! {
                result = notification_stream.next() => {
                    match result {
                        Some(Ok(value)) => {
                            NotificationHandler::deliver(&callback, value);
                        }
                        Some(Err(e)) => {
                            error!("Error in notification stream: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
                _ = cancel_token.cancelled() => break,
            }
        }
        info!("Notification stream ended");
    }
}

#[async_trait]
impl BleCharacteristic for BluestCharacteristic {
    fn uuid(&self) -> String {
        self.0.uuid().to_string()
    }

    async fn subscribe(&self, callback: NotifyCallback) -> Result<Subscription, BleError> {
        info!("Subscribing to notifications...");
        let cancel_token = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(Self::process_notifications(
            self.0.clone(),
            callback,
            cancel_token.clone(),
            ready_tx,
        ));

        match ready_rx.await {
            Ok(Ok(())) => Ok(Subscription::new(self.uuid(), cancel_token)),
            Ok(Err(e)) => Err(BleError::SubscribeFailed {
                uuid: self.uuid(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BleError::SubscribeFailed {
                uuid: self.uuid(),
                reason: "notification task ended before subscribing".to_string(),
            }),
        }
    }
}

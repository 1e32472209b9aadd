//! In-memory Bluetooth stack for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::error::BleError;
use crate::core::bluetooth::notification::NotificationHandler;
use crate::core::bluetooth::stack::{BleAdapter, BleCharacteristic, BleDevice, BleService};
use crate::core::bluetooth::types::{ManufacturerData, NotifyCallback, Subscription};

/// Pops scripted responses; the last one repeats forever
#[derive(Debug)]
struct Script<T: Clone>(Mutex<VecDeque<T>>);

impl<T: Clone> Default for Script<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone> Script<T> {
    fn new(items: Vec<T>) -> Self {
        Self(Mutex::new(items.into()))
    }

    fn next(&self, fallback: T) -> T {
        let mut queue = self.0.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or(fallback)
        }
    }
}

#[derive(Default)]
pub struct FakeAdapter {
    visible: Script<Option<Vec<FakeDevice>>>,
    findable: Mutex<Option<FakeDevice>>,
    pub list_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub fail_start: AtomicBool,
    pub stop_calls: AtomicUsize,
    pub fail_stop: AtomicBool,
    pub last_find_timeout: Mutex<Option<Duration>>,
}

impl FakeAdapter {
    /// Each call to `visible_devices` returns the next list; the last one repeats
    pub fn with_visible(lists: Vec<Option<Vec<FakeDevice>>>) -> Self {
        Self {
            visible: Script::new(lists),
            ..Default::default()
        }
    }

    pub fn with_findable(device: FakeDevice) -> Self {
        let adapter = Self::default();
        *adapter.findable.lock().unwrap() = Some(device);
        adapter
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BleAdapter for FakeAdapter {
    type Device = FakeDevice;

    async fn start_scan(&self) -> Result<(), BleError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BleError::DiscoveryStartFailed("adapter powered off".into()));
        }
        Ok(())
    }

    async fn stop_scan(&self) -> Result<(), BleError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(BleError::DiscoveryStopFailed("radio busy".into()));
        }
        Ok(())
    }

    async fn visible_devices(&self) -> Option<Vec<FakeDevice>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.visible.next(None)
    }

    async fn find_device(&self, address: &str, timeout: Duration) -> Option<FakeDevice> {
        *self.last_find_timeout.lock().unwrap() = Some(timeout);
        self.findable
            .lock()
            .unwrap()
            .clone()
            .filter(|device| device.address() == address)
    }
}

#[derive(Debug)]
struct DeviceInner {
    address: String,
    name: Option<String>,
    connect_ok: bool,
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    services: Script<Option<Vec<FakeService>>>,
    services_calls: AtomicUsize,
    manufacturer_data: Mutex<ManufacturerData>,
    data_reads: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct FakeDevice(Arc<DeviceInner>);

impl FakeDevice {
    pub fn new(address: &str) -> Self {
        Self::build(address, true, vec![])
    }

    pub fn unreachable(address: &str) -> Self {
        Self::build(address, false, vec![])
    }

    /// Each call to `services` returns the next list; the last one repeats
    pub fn with_services(address: &str, lists: Vec<Option<Vec<FakeService>>>) -> Self {
        Self::build(address, true, lists)
    }

    fn build(address: &str, connect_ok: bool, lists: Vec<Option<Vec<FakeService>>>) -> Self {
        Self(Arc::new(DeviceInner {
            address: address.to_string(),
            name: Some("DOOR".to_string()),
            connect_ok,
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            services: Script::new(lists),
            services_calls: AtomicUsize::new(0),
            manufacturer_data: Mutex::new(ManufacturerData::new()),
            data_reads: AtomicUsize::new(0),
        }))
    }

    pub fn set_manufacturer_data(&self, data: ManufacturerData) {
        *self.0.manufacturer_data.lock().unwrap() = data;
    }

    pub fn connect_calls(&self) -> usize {
        self.0.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.0.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn services_calls(&self) -> usize {
        self.0.services_calls.load(Ordering::SeqCst)
    }

    pub fn data_reads(&self) -> usize {
        self.0.data_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BleDevice for FakeDevice {
    type Service = FakeService;

    fn address(&self) -> String {
        self.0.address.clone()
    }

    fn name(&self) -> Option<String> {
        self.0.name.clone()
    }

    async fn is_connected(&self) -> bool {
        self.0.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), BleError> {
        self.0.connect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.0.connect_ok {
            return Err(BleError::ConnectFailed {
                address: self.address(),
                reason: "out of range".into(),
            });
        }
        self.0.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BleError> {
        self.0.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.0.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn services(&self) -> Option<Vec<FakeService>> {
        self.0.services_calls.fetch_add(1, Ordering::SeqCst);
        self.0.services.next(None)
    }

    async fn manufacturer_data(&self) -> ManufacturerData {
        self.0.data_reads.fetch_add(1, Ordering::SeqCst);
        self.0.manufacturer_data.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
pub struct FakeService {
    uuid: String,
    pub tag: &'static str,
    characteristics: Option<Vec<FakeCharacteristic>>,
}

impl FakeService {
    pub fn new(uuid: &str, characteristics: Option<Vec<FakeCharacteristic>>) -> Self {
        Self::tagged(uuid, "", characteristics)
    }

    pub fn tagged(uuid: &str, tag: &'static str, characteristics: Option<Vec<FakeCharacteristic>>) -> Self {
        Self {
            uuid: uuid.to_string(),
            tag,
            characteristics,
        }
    }
}

#[async_trait]
impl BleService for FakeService {
    type Characteristic = FakeCharacteristic;

    fn uuid(&self) -> String {
        self.uuid.clone()
    }

    async fn characteristics(&self) -> Option<Vec<FakeCharacteristic>> {
        self.characteristics.clone()
    }
}

#[derive(Default)]
struct CharacteristicInner {
    uuid: String,
    callbacks: Mutex<Vec<NotifyCallback>>,
    subscribe_calls: AtomicUsize,
}

impl std::fmt::Debug for CharacteristicInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacteristicInner").field("uuid", &self.uuid).finish()
    }
}

#[derive(Debug, Clone)]
pub struct FakeCharacteristic(Arc<CharacteristicInner>);

impl FakeCharacteristic {
    pub fn new(uuid: &str) -> Self {
        Self(Arc::new(CharacteristicInner {
            uuid: uuid.to_string(),
            ..Default::default()
        }))
    }

    pub fn subscribe_calls(&self) -> usize {
        self.0.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Simulates the stack delivering a value change
    pub fn notify(&self, payload: &[u8]) {
        for callback in self.0.callbacks.lock().unwrap().iter() {
            NotificationHandler::deliver(callback, payload.to_vec());
        }
    }
}

#[async_trait]
impl BleCharacteristic for FakeCharacteristic {
    fn uuid(&self) -> String {
        self.0.uuid.clone()
    }

    async fn subscribe(&self, callback: NotifyCallback) -> Result<Subscription, BleError> {
        self.0.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.0.callbacks.lock().unwrap().push(callback);
        Ok(Subscription::new(self.uuid(), CancellationToken::new()))
    }
}

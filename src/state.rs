//! Application state management
//! This module owns the Bluetooth manager across the start and stop hooks.

use std::sync::Arc;

use anyhow::Result;
use log::info;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::core::BluetoothManager;
use crate::core::bluetooth::{BleAdapter, BluestAdapter};

/// Global application state
pub struct AppState<A: BleAdapter = BluestAdapter> {
    /// The Bluetooth manager instance
    pub bluetooth_manager: Arc<Mutex<BluetoothManager<A>>>,
}

impl AppState<BluestAdapter> {
    /// Creates a new AppState on the host's default adapter
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing BluetoothManager...");
        let adapter = BluestAdapter::new().await?;
        Ok(Self::with_adapter(Arc::new(adapter), config))
    }
}

impl<A: BleAdapter> AppState<A> {
    pub fn with_adapter(adapter: Arc<A>, config: AppConfig) -> Self {
        Self {
            bluetooth_manager: Arc::new(Mutex::new(BluetoothManager::new(adapter, config))),
        }
    }

    /// Gets a reference to the Bluetooth manager
    pub fn get_bluetooth_manager_arc(&self) -> Arc<Mutex<BluetoothManager<A>>> {
        self.bluetooth_manager.clone()
    }
}

//! Core functionality for the door sensor bridge
//! This module contains the Bluetooth workflows and the shutdown signal

pub mod bluetooth;
pub mod shutdown;

// Re-export commonly used types
pub use bluetooth::{BleError, BluetoothManager};
pub use shutdown::ShutdownLatch;

//! Door BLE bridge library
//! Locates the door sensor over BLE and either subscribes to its GATT
//! notifications or polls its advertisement data.

// Module declarations
pub mod commands;
pub mod config;
pub mod core;
pub mod logging;
pub mod state;
pub mod utils;

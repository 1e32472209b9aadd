//! Entry point commands
//! Each command drives one mode of the bridge from start to exit.

use anyhow::{Context, Result};
use log::{error, info};

use crate::config::AppConfig;
use crate::core::ShutdownLatch;
use crate::core::bluetooth::{BleAdapter, NotificationHandler, NotifyCallback};
use crate::state::AppState;

/// Runs the start hook, waits for `latch`, then runs the stop hook.
///
/// A start failure is logged and the stop hook still runs, so a device
/// that was connected before the failure gets released.
pub async fn run_start<A: BleAdapter>(
    app_state: &AppState<A>,
    latch: &ShutdownLatch,
    on_notify: NotifyCallback,
) -> Result<bool> {
    let bluetooth_manager_arc = app_state.get_bluetooth_manager_arc();
    let mut bluetooth_manager_guard = bluetooth_manager_arc.lock().await;

    let started = match bluetooth_manager_guard.start(on_notify).await {
        Ok(()) => {
            info!("Waiting for notifications, press Ctrl-C to stop");
            latch.wait().await;
            true
        }
        Err(e) => {
            error!("Start failed: {}", e);
            false
        }
    };

    bluetooth_manager_guard
        .stop()
        .await
        .context("Failed to disconnect the sensor")?;
    Ok(started)
}

/// Runs the advertisement poller until `latch` is signalled
pub async fn run_beacon<A: BleAdapter>(app_state: &AppState<A>, latch: &ShutdownLatch) -> Result<()> {
    let (poller, address) = {
        let bluetooth_manager_arc = app_state.get_bluetooth_manager_arc();
        let bluetooth_manager_guard = bluetooth_manager_arc.lock().await;
        (
            bluetooth_manager_guard.poller(latch.clone()),
            bluetooth_manager_guard.config().device.address.clone(),
        )
    };

    let summary = poller.run(&address).await?;
    info!("Beacon finished after {} reads", summary.reads);
    Ok(())
}

/// `start` command on the host adapter
pub async fn start(config: AppConfig) -> Result<bool> {
    let app_state = AppState::new(config).await?;
    let latch = ShutdownLatch::new();
    latch.spawn_signal_listener();
    run_start(&app_state, &latch, NotificationHandler::log_payload()).await
}

/// `beacon` command on the host adapter
pub async fn beacon(config: AppConfig) -> Result<()> {
    let app_state = AppState::new(config).await?;
    let latch = ShutdownLatch::new();
    latch.spawn_signal_listener();
    run_beacon(&app_state, &latch).await
}

//! Cooperative shutdown signal for the polling loop

use std::time::Duration;

use log::{error, info};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Running flag that flips once and wakes every waiter.
///
/// The flag is sticky: a signal sent before anyone waits is still seen by
/// the next `await_tick`. Clones share the same flag and can be signalled
/// from any thread.
#[derive(Debug, Clone, Default)]
pub struct ShutdownLatch {
    cancel_token: CancellationToken,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel_token.is_cancelled()
    }

    /// Clears the running flag and wakes all waiters
    pub fn signal_shutdown(&self) {
        if self.is_running() {
            info!("Shutdown requested");
        }
        self.cancel_token.cancel();
    }

    /// Waits up to `timeout`, returning early once shutdown is signalled.
    /// Returns `true` when woken by the signal.
    pub async fn await_tick(&self, timeout: Duration) -> bool {
        tokio::select! {
            _ = self.cancel_token.cancelled() => true,
            _ = sleep(timeout) => false,
        }
    }

    /// Resolves once shutdown has been signalled
    pub async fn wait(&self) {
        self.cancel_token.cancelled().await;
    }

    /// Turns Ctrl-C (and SIGTERM on unix) into `signal_shutdown`
    pub fn spawn_signal_listener(&self) -> JoinHandle<()> {
        let latch = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        return;
                    }
                }
                _ = terminate() => {}
                _ = latch.wait() => return,
            }
            latch.signal_shutdown();
        })
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn tick_runs_full_interval_while_running() {
        let latch = ShutdownLatch::new();
        let start = Instant::now();

        assert!(!latch.await_tick(Duration::from_secs(1)).await);

        assert!(latch.is_running());
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn signal_before_wait_is_not_missed() {
        let latch = ShutdownLatch::new();
        latch.signal_shutdown();
        let start = Instant::now();

        assert!(latch.await_tick(Duration::from_secs(60)).await);

        assert!(!latch.is_running());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn signal_from_another_thread_wakes_the_waiter() {
        let latch = ShutdownLatch::new();
        let remote = latch.clone();
        let signaller = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            remote.signal_shutdown();
        });
        let start = std::time::Instant::now();

        assert!(latch.await_tick(Duration::from_secs(30)).await);

        assert!(start.elapsed() < Duration::from_secs(5));
        signaller.join().unwrap();
    }

    #[tokio::test]
    async fn repeated_signals_are_harmless() {
        let latch = ShutdownLatch::new();
        let clone = latch.clone();

        latch.signal_shutdown();
        clone.signal_shutdown();

        assert!(!latch.is_running());
        assert!(!clone.is_running());
        latch.wait().await;
    }
}

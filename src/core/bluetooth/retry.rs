//! Attempt-bounded retry loop shared by device discovery and service lookup

use std::future::Future;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::core::bluetooth::constants::{DISCOVERY_RETRY_DELAY_MS, MAX_DISCOVERY_ATTEMPTS};

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_DISCOVERY_ATTEMPTS,
            delay_ms: DISCOVERY_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Outcome of one attempt
#[derive(Debug)]
pub enum Attempt<T> {
    /// Stop with this value
    Done(T),
    /// Nothing yet, try again after the delay
    Retry,
    /// Give up now without sleeping
    Abort,
}

/// Runs `attempt` until it yields a value, aborts, or the policy is exhausted.
/// Sleeps only between attempts, never after the last one.
pub async fn retry_until<T, F, Fut>(policy: &RetryPolicy, what: &str, mut attempt: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    for n in 1..=policy.max_attempts {
        match attempt(n).await {
            Attempt::Done(value) => return Some(value),
            Attempt::Abort => {
                debug!("Giving up on {} at attempt {}", what, n);
                return None;
            }
            Attempt::Retry => {
                if n < policy.max_attempts {
                    debug!("{} not ready after attempt {}, retrying in {} ms", what, n, policy.delay_ms);
                    sleep(policy.delay()).await;
                }
            }
        }
    }
    debug!("{} not found after {} attempts", what, policy.max_attempts);
    None
}

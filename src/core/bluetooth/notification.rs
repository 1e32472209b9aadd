//! Notification handling for the door sensor
//! This module builds the payload callbacks and dispatches payloads to them

use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{debug, error, info};

use crate::core::bluetooth::types::NotifyCallback;

/// Builds notification callbacks
pub struct NotificationHandler;

impl NotificationHandler {
    /// Callback that logs every payload as text
    pub fn log_payload() -> NotifyCallback {
        Box::new(|payload: Vec<u8>| {
            debug!("Received sensor data: {:?}", payload);
            info!("{}", decode_payload(&payload));
        })
    }

    /// Hands one payload to `callback`.
    /// A panicking callback is logged and the caller keeps delivering.
    pub fn deliver(callback: &NotifyCallback, payload: Vec<u8>) -> bool {
        match catch_unwind(AssertUnwindSafe(|| callback(payload))) {
            Ok(()) => true,
            Err(_) => {
                error!("Notification callback panicked, payload dropped");
                false
            }
        }
    }
}

/// Best-effort UTF-8 rendering of a payload
pub fn decode_payload(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn deliver_passes_payload_through() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: NotifyCallback = Box::new(move |payload| sink.lock().unwrap().push(payload));

        assert!(NotificationHandler::deliver(&callback, b"OPEN".to_vec()));
        assert_eq!(*seen.lock().unwrap(), vec![b"OPEN".to_vec()]);
    }

    #[test]
    fn panicking_callback_does_not_escape() {
        let callback: NotifyCallback = Box::new(|_| panic!("boom"));

        assert!(!NotificationHandler::deliver(&callback, vec![1]));
        // still callable afterwards
        assert!(!NotificationHandler::deliver(&callback, vec![2]));
    }

    #[test]
    fn decode_is_lossy_for_binary_payloads() {
        assert_eq!(decode_payload(b"CLOSED"), "CLOSED");
        assert_eq!(decode_payload(&[0xff, b'a']), "\u{fffd}a");
    }

    #[test]
    fn log_payload_accepts_any_bytes() {
        let callback = NotificationHandler::log_payload();
        assert!(NotificationHandler::deliver(&callback, vec![0x00, 0xff, 0x10]));
    }
}

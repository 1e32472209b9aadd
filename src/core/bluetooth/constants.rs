//! Constants used throughout the application
//! Default addresses, UUIDs and timings. Every value here can be overridden
//! through `AppConfig`.

use uuid::Uuid;

/// Hardware address of the door sensor
pub const DOOR_BLE_ADDRESS: &str = "F5:73:02:70:37:F2";

/// The UUID of the door sensor service (Nordic UART layout)
pub const UUID_SENSOR_SERVICE: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);

/// The UUID of the sensor value characteristic
pub const UUID_SENSOR_VALUE_CHAR: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);

/// The UUID of the sensor period characteristic
pub const UUID_SENSOR_PERIOD_CHAR: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// Maximum number of discovery attempts
pub const MAX_DISCOVERY_ATTEMPTS: u32 = 10;

/// Delay between discovery attempts in milliseconds
pub const DISCOVERY_RETRY_DELAY_MS: u64 = 1000;

/// Timeout for the blocking find in seconds
pub const SCAN_TIMEOUT_SECS: u64 = 10;

/// Interval between manufacturer data reads in milliseconds
pub const POLL_INTERVAL_MS: u64 = 1000;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::bluetooth::{
    DOOR_BLE_ADDRESS, GattTarget, UUID_SENSOR_PERIOD_CHAR, UUID_SENSOR_SERVICE,
    UUID_SENSOR_VALUE_CHAR,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Hardware address of the sensor, upper-case and colon separated.
    /// Matched exactly against the addresses the adapter reports.
    pub address: String,

    /// GATT service holding the sensor characteristics
    pub service_uuid: Uuid,

    /// Sensor value characteristic. It must be present, but nothing subscribes to it.
    pub value_char_uuid: Uuid,

    /// Characteristic whose notifications are logged
    pub period_char_uuid: Uuid,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            address: DOOR_BLE_ADDRESS.to_string(),
            service_uuid: UUID_SENSOR_SERVICE,
            value_char_uuid: UUID_SENSOR_VALUE_CHAR,
            period_char_uuid: UUID_SENSOR_PERIOD_CHAR,
        }
    }
}

impl From<&DeviceConfig> for GattTarget {
    fn from(config: &DeviceConfig) -> Self {
        GattTarget {
            service: config.service_uuid,
            value_char: config.value_char_uuid,
            period_char: config.period_char_uuid,
        }
    }
}

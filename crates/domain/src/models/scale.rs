//! Scale identity model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A scale known to the server, created the first time it makes contact.
///
/// The MAC address is the identity; the serial number is the same bytes in
/// the form the scale reports over its registration URL (lowercase hex, no
/// separators). Firmware, battery, and last-seen are refreshed on every
/// upload. Rows are never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Scale {
    pub id: i64,
    pub mac_address: String,
    pub serial_number: String,
    pub firmware_version: Option<i16>,
    pub protocol_version: Option<i16>,
    pub battery_percent: Option<i16>,
    pub last_ssid: Option<String>,
    /// 16 raw bytes, stored as hex.
    pub auth_code: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_keys() {
        let scale = Scale {
            id: 1,
            mac_address: "AA:BB:CC:DD:EE:FF".to_string(),
            serial_number: "aabbccddeeff".to_string(),
            firmware_version: Some(39),
            protocol_version: Some(3),
            battery_percent: Some(85),
            last_ssid: Some("home".to_string()),
            auth_code: None,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
        };
        let json = serde_json::to_value(&scale).unwrap();
        assert_eq!(json["mac_address"], "AA:BB:CC:DD:EE:FF");
        assert_eq!(json["serial_number"], "aabbccddeeff");
        assert_eq!(json["battery_percent"], 85);
        assert!(json["auth_code"].is_null());
    }
}

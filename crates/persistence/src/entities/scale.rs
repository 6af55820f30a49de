//! Scale entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the scales table.
#[derive(Debug, Clone, FromRow)]
pub struct ScaleEntity {
    pub id: i64,
    pub mac_address: String,
    pub serial_number: String,
    pub firmware_version: Option<i16>,
    pub protocol_version: Option<i16>,
    pub battery_percent: Option<i16>,
    pub last_ssid: Option<String>,
    pub auth_code: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl From<ScaleEntity> for domain::models::Scale {
    fn from(entity: ScaleEntity) -> Self {
        Self {
            id: entity.id,
            mac_address: entity.mac_address,
            serial_number: entity.serial_number,
            firmware_version: entity.firmware_version,
            protocol_version: entity.protocol_version,
            battery_percent: entity.battery_percent,
            last_ssid: entity.last_ssid,
            auth_code: entity.auth_code,
            first_seen: entity.first_seen,
            last_seen: entity.last_seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_to_domain() {
        let entity = ScaleEntity {
            id: 7,
            mac_address: "AA:BB:CC:DD:EE:FF".to_string(),
            serial_number: "aabbccddeeff".to_string(),
            firmware_version: Some(39),
            protocol_version: Some(3),
            battery_percent: Some(85),
            last_ssid: None,
            auth_code: Some("5a".repeat(16)),
            first_seen: Utc::now(),
            last_seen: Utc::now(),
        };
        let scale: domain::models::Scale = entity.clone().into();
        assert_eq!(scale.id, entity.id);
        assert_eq!(scale.mac_address, entity.mac_address);
        assert_eq!(scale.firmware_version, Some(39));
    }
}

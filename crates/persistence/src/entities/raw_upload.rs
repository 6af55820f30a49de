//! Raw upload entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Row mapping for the raw-uploads debug view. Blob sizes are computed in
/// SQL; the blobs themselves are never pulled out of the database here.
#[derive(Debug, Clone, FromRow)]
pub struct RawUploadSummaryEntity {
    pub id: i64,
    pub received_at: DateTime<Utc>,
    pub scale_mac: Option<String>,
    pub protocol_version: Option<i16>,
    pub firmware_version: Option<i16>,
    pub battery_percent: Option<i16>,
    pub scale_timestamp: Option<i64>,
    pub measurement_count: Option<i32>,
    pub request_size: i32,
    pub response_size: i32,
    pub parse_ok: bool,
    pub error_message: Option<String>,
}

impl From<RawUploadSummaryEntity> for domain::models::RawUploadSummary {
    fn from(entity: RawUploadSummaryEntity) -> Self {
        Self {
            id: entity.id,
            received_at: entity.received_at,
            scale_mac: entity.scale_mac,
            protocol_version: entity.protocol_version,
            firmware_version: entity.firmware_version,
            battery_percent: entity.battery_percent,
            scale_timestamp: entity.scale_timestamp,
            measurement_count: entity.measurement_count,
            request_size: entity.request_size,
            response_size: entity.response_size,
            parse_ok: entity.parse_ok,
            error_message: entity.error_message,
        }
    }
}

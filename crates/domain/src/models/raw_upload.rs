//! Raw upload debug model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Debug view over a stored raw upload: decoded metadata plus blob sizes.
/// The byte blobs themselves stay in the database.
#[derive(Debug, Clone, Serialize)]
pub struct RawUploadSummary {
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

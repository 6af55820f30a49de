//! Measurement entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the measurements table.
#[derive(Debug, Clone, FromRow)]
pub struct MeasurementEntity {
    pub id: i64,
    pub scale_mac: String,
    pub measurement_id: i64,
    pub weight_grams: i64,
    pub impedance: i32,
    pub fat_raw_1: i32,
    pub fat_raw_2: i32,
    pub covariance: i32,
    pub body_fat_percent: Option<f32>,
    pub timestamp_raw: i64,
    pub timestamp: DateTime<Utc>,
    pub user_slot: i16,
    pub is_guest: bool,
    pub received_at: DateTime<Utc>,
}

impl From<MeasurementEntity> for domain::models::Measurement {
    fn from(entity: MeasurementEntity) -> Self {
        Self {
            id: entity.id,
            scale_mac: entity.scale_mac,
            measurement_id: entity.measurement_id,
            weight_grams: entity.weight_grams,
            impedance: entity.impedance,
            fat_raw_1: entity.fat_raw_1,
            fat_raw_2: entity.fat_raw_2,
            covariance: entity.covariance,
            body_fat_percent: entity.body_fat_percent,
            timestamp_raw: entity.timestamp_raw,
            timestamp: entity.timestamp,
            user_slot: entity.user_slot,
            is_guest: entity.is_guest,
            received_at: entity.received_at,
        }
    }
}

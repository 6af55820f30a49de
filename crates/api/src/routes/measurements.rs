//! Measurement read views.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::Measurement;
use persistence::repositories::{MeasurementQuery, MeasurementRepository};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ListMeasurementsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Filter by scale slot (the scale's notion of a user).
    pub user_id: Option<i16>,
    pub scale_mac: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LatestMeasurementQuery {
    pub user_id: Option<i16>,
}

/// Measurement as exposed over the management API. Grams are canonical;
/// kilograms and pounds are derived here, at the boundary.
#[derive(Debug, Serialize)]
pub struct MeasurementResponse {
    pub id: i64,
    pub scale_mac: String,
    pub measurement_id: i64,
    pub weight_grams: i64,
    pub weight_kg: f64,
    pub weight_lbs: f64,
    pub impedance: i32,
    pub body_fat_percent: Option<f32>,
    pub fat_raw_1: i32,
    pub fat_raw_2: i32,
    pub covariance: i32,
    pub timestamp: DateTime<Utc>,
    pub timestamp_raw: i64,
    pub user_slot: i16,
    pub is_guest: bool,
    pub received_at: DateTime<Utc>,
}

impl From<Measurement> for MeasurementResponse {
    fn from(m: Measurement) -> Self {
        Self {
            id: m.id,
            scale_mac: m.scale_mac.clone(),
            measurement_id: m.measurement_id,
            weight_grams: m.weight_grams,
            weight_kg: m.weight_kg(),
            weight_lbs: m.weight_lbs(),
            impedance: m.impedance,
            body_fat_percent: m.body_fat_percent,
            fat_raw_1: m.fat_raw_1,
            fat_raw_2: m.fat_raw_2,
            covariance: m.covariance,
            timestamp: m.timestamp,
            timestamp_raw: m.timestamp_raw,
            user_slot: m.user_slot,
            is_guest: m.is_guest,
            received_at: m.received_at,
        }
    }
}

/// Paginated measurement listing, newest first.
///
/// GET /api/measurements?limit=&offset=&user_id=&scale_mac=
pub async fn list_measurements(
    State(state): State<AppState>,
    Query(query): Query<ListMeasurementsQuery>,
) -> Result<Json<Vec<MeasurementResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let repo = MeasurementRepository::new(state.pool.clone());
    let entities = repo
        .list(MeasurementQuery {
            limit,
            offset,
            user_slot: query.user_id,
            scale_mac: query.scale_mac.map(|mac| mac.to_uppercase()),
        })
        .await?;

    info!(count = entities.len(), "measurements listed");

    Ok(Json(
        entities
            .into_iter()
            .map(|e| MeasurementResponse::from(Measurement::from(e)))
            .collect(),
    ))
}

/// Single most recent measurement, optionally per user slot.
///
/// GET /api/measurements/latest?user_id=
pub async fn latest_measurement(
    State(state): State<AppState>,
    Query(query): Query<LatestMeasurementQuery>,
) -> Result<Json<MeasurementResponse>, ApiError> {
    let repo = MeasurementRepository::new(state.pool.clone());
    let entity = repo
        .latest(query.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No measurements found".to_string()))?;

    Ok(Json(MeasurementResponse::from(Measurement::from(entity))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn response_derives_display_units() {
        let m = Measurement {
            id: 1,
            scale_mac: "AA:BB:CC:DD:EE:FF".to_string(),
            measurement_id: 1,
            weight_grams: 75_300,
            impedance: 520,
            fat_raw_1: 370,
            fat_raw_2: 370,
            covariance: 12,
            body_fat_percent: Some(37.0),
            timestamp_raw: 1_705_315_840,
            timestamp: Utc.timestamp_opt(1_705_315_840, 0).unwrap(),
            user_slot: 1,
            is_guest: false,
            received_at: Utc::now(),
        };
        let response = MeasurementResponse::from(m);
        assert!((response.weight_kg - 75.3).abs() < 1e-9);
        assert!((response.weight_lbs - 166.0).abs() < 0.1);
        assert_eq!(response.weight_grams, 75_300);
    }

    #[test]
    fn list_query_fields_are_all_optional() {
        let query: ListMeasurementsQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(query.limit.is_none());
        assert!(query.user_id.is_none());

        let query: ListMeasurementsQuery = serde_json::from_value(serde_json::json!({
            "limit": 50, "offset": 10, "user_id": 3, "scale_mac": "aa:bb:cc:dd:ee:ff"
        }))
        .unwrap();
        assert_eq!(query.limit, Some(50));
        assert_eq!(query.user_id, Some(3));
    }

    #[test]
    fn limit_is_clamped_to_bounds() {
        assert_eq!(5000i64.clamp(1, MAX_LIMIT), MAX_LIMIT);
        assert_eq!(0i64.clamp(1, MAX_LIMIT), 1);
    }
}

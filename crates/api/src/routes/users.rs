//! User profile management.
//!
//! Profiles created here are pushed down to the scale in the next upload
//! response, in slot order. Creation picks the lowest free slot 0..7.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::{CreateUserParams, UserProfile};
use persistence::repositories::UserRepository;

/// Profile as exposed over the management API: heights in centimetres,
/// weights in kilograms, matching the units the operator typed in.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub scale_slot: i16,
    pub height_cm: i32,
    pub age: i16,
    /// 0 = female, 1 = male (the scale's encoding).
    pub gender: i16,
    pub min_weight_kg: f64,
    pub max_weight_kg: f64,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            scale_slot: user.scale_slot,
            height_cm: user.height_mm / 10,
            age: user.age,
            gender: user.gender,
            min_weight_kg: user.min_weight_grams as f64 / 1000.0,
            max_weight_kg: user.max_weight_grams as f64 / 1000.0,
            created_at: user.created_at,
        }
    }
}

/// Active profiles in slot order.
///
/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let users = repo
        .list_active()
        .await?
        .into_iter()
        .map(|e| UserResponse::from(UserProfile::from(e)))
        .collect();
    Ok(Json(users))
}

/// Create a profile in the lowest free slot.
///
/// POST /api/users?name=&height_cm=&age=&gender=&min_weight_kg=&max_weight_kg=
pub async fn create_user(
    State(state): State<AppState>,
    Query(params): Query<CreateUserParams>,
) -> Result<Json<UserResponse>, ApiError> {
    params.validate()?;
    if params.min_weight_kg >= params.max_weight_kg {
        return Err(ApiError::BadRequest(
            "min_weight_kg must be less than max_weight_kg".to_string(),
        ));
    }

    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .create(
            &params.name,
            params.height_mm(),
            params.age,
            params.gender,
            params.min_weight_grams(),
            params.max_weight_grams(),
        )
        .await?;

    info!(id = user.id, slot = user.scale_slot, name = %user.name, "user profile created");

    Ok(Json(UserResponse::from(UserProfile::from(user))))
}

/// Delete a profile, freeing its slot for the next create.
///
/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let affected = repo.deactivate(id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound(format!("User {} not found", id)));
    }

    info!(id, "user profile deleted");
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_converts_back_to_operator_units() {
        let profile = UserProfile {
            id: 4,
            name: "Alice".to_string(),
            scale_slot: 0,
            height_mm: 1650,
            age: 30,
            gender: 0,
            min_weight_grams: 40_000,
            max_weight_grams: 90_000,
            created_at: Utc::now(),
        };
        let response = UserResponse::from(profile);
        assert_eq!(response.height_cm, 165);
        assert_eq!(response.min_weight_kg, 40.0);
        assert_eq!(response.max_weight_kg, 90.0);
    }
}

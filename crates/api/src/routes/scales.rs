//! Scale registry read view.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::Scale;
use persistence::repositories::ScaleRepository;

/// All scales that have ever made contact.
///
/// GET /api/scales
pub async fn list_scales(State(state): State<AppState>) -> Result<Json<Vec<Scale>>, ApiError> {
    let repo = ScaleRepository::new(state.pool.clone());
    let scales = repo
        .list_all()
        .await?
        .into_iter()
        .map(Scale::from)
        .collect();
    Ok(Json(scales))
}

/// Look up one scale by its colon-separated MAC, case-insensitive.
///
/// GET /api/scales/{mac}
pub async fn get_scale(
    State(state): State<AppState>,
    Path(mac): Path<String>,
) -> Result<Json<Scale>, ApiError> {
    let repo = ScaleRepository::new(state.pool.clone());
    let scale = repo
        .find_by_mac(&mac.to_uppercase())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Scale {} not found", mac)))?;
    Ok(Json(Scale::from(scale)))
}

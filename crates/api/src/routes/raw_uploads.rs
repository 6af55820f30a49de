//! Raw-uploads debug view: the only place decode and validation problems
//! are visible, since the scale itself is always told everything went fine.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::RawUploadSummary;
use persistence::repositories::RawUploadRepository;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListRawUploadsQuery {
    pub errors_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Raw upload listing, newest first.
///
/// GET /api/raw-uploads?errors_only=&limit=&offset=
pub async fn list_raw_uploads(
    State(state): State<AppState>,
    Query(query): Query<ListRawUploadsQuery>,
) -> Result<Json<Vec<RawUploadSummary>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let repo = RawUploadRepository::new(state.pool.clone());
    let uploads = repo
        .list_summaries(query.errors_only.unwrap_or(false), limit, offset)
        .await?
        .into_iter()
        .map(RawUploadSummary::from)
        .collect();

    Ok(Json(uploads))
}

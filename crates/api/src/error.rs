use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use persistence::repositories::CreateUserError;

/// Errors surfaced by the management API as `{error, detail}` JSON.
///
/// Scale endpoints never go through this type: the device cannot read JSON
/// and loops on non-2xx, so their failure modes are a valid-but-empty binary
/// response or a bare 503 (see `routes::scale`).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("All scale slots are taken")]
    NoFreeSlot,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, detail) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::NoFreeSlot => (
                StatusCode::BAD_REQUEST,
                "no_free_slot",
                "all 8 scale slots are taken".into(),
            ),
            ApiError::StoreUnavailable(msg) => {
                tracing::error!("store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "database unavailable".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            _ => ApiError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<CreateUserError> for ApiError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::NoFreeSlot => ApiError::NoFreeSlot,
            CreateUserError::Database(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.clone().map(|m| m.to_string()).unwrap_or_default()
                    )
                })
            })
            .collect();

        ApiError::BadRequest(details.join(", "))
    }
}

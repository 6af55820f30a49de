//! The endpoints the scale itself talks to.
//!
//! These never return JSON and never surface parse problems as HTTP errors:
//! the device only understands its own binary response and treats anything
//! else as a reason to retry forever. The single exception is a 503 with an
//! empty body when the store is down. Retrying that upload is safe because
//! the failed transaction persisted nothing.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::app::AppState;
use crate::services::ingest::{ingest_upload, IngestError};
use persistence::repositories::ScaleRepository;
use protocol::MacAddress;

/// Connectivity probe. The scale proceeds only on an exact `T`.
///
/// GET /scale/validate
pub async fn validate() -> &'static str {
    info!("scale validation request");
    "T"
}

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    /// MAC address as 12 hex characters, no separators.
    #[serde(rename = "serialNumber")]
    pub serial_number: Option<String>,
    pub token: Option<String>,
    pub ssid: Option<String>,
}

/// Registration callback during scale setup. Records the device when the
/// query carries a plausible serial; acknowledges regardless, because a
/// setup-mode scale gives up on anything but `S`.
///
/// GET /scale/register
pub async fn register(
    State(state): State<AppState>,
    Query(query): Query<RegisterQuery>,
) -> &'static str {
    let serial = query.serial_number.as_deref().unwrap_or("");
    info!(serial, ssid = query.ssid.as_deref().unwrap_or(""), "scale registration request");

    if let Some(mac) = MacAddress::from_serial(serial) {
        let repo = ScaleRepository::new(state.pool.clone());
        let result = repo
            .upsert_from_registration(
                &mac.to_string(),
                &mac.serial(),
                query.ssid.as_deref().filter(|s| !s.is_empty()),
                query.token.as_deref().filter(|s| !s.is_empty()),
            )
            .await;
        match result {
            Ok(_) => info!(mac = %mac, "scale registered"),
            Err(e) => warn!(mac = %mac, error = %e, "failed to record registration"),
        }
    } else if !serial.is_empty() {
        warn!(serial, "registration with malformed serial number ignored");
    }

    "S\n"
}

/// Measurement upload: binary frame in, binary response out.
///
/// POST /scale/upload
pub async fn upload(State(state): State<AppState>, body: Bytes) -> Response {
    info!(len = body.len(), "upload received");

    match ingest_upload(&state.pool, state.weight_unit, &body).await {
        Ok(response) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            response,
        )
            .into_response(),
        Err(IngestError::Store(e)) => {
            warn!(error = %e, "upload rolled back, scale will retry");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// WiFi-setup callback; nothing to do but acknowledge.
///
/// GET /scale/setup
pub async fn setup() -> &'static str {
    info!("scale setup request");
    "OK"
}

/// Unknown firmware endpoints get a flat `OK` so the device never hangs on
/// a route we have not mapped.
pub async fn catch_all(method: Method, uri: Uri) -> &'static str {
    warn!(%method, path = %uri.path(), "unhandled request");
    "OK"
}

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::routes::{health, measurements, raw_uploads, scale, scales, users};
use protocol::WeightUnit;

/// Scale frames are tiny; anything near this size is not a scale.
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub weight_unit: WeightUnit,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let weight_unit = config.weight_unit.parse().unwrap_or_default();
    let state = AppState {
        pool,
        config: Arc::new(config),
        weight_unit,
    };

    // The management API is meant for browsers and dashboards on the local
    // network; the scale endpoints ignore CORS entirely.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Endpoints the scale firmware calls. Any Host header is accepted; the
    // operator's DNS points the vendor hostnames here.
    let scale_routes = Router::new()
        .route("/scale/validate", get(scale::validate))
        .route("/scale/register", get(scale::register))
        .route("/scale/upload", post(scale::upload))
        .route("/scale/setup", get(scale::setup));

    let management_routes = Router::new()
        .route("/", get(health::service_info))
        .route("/api/health", get(health::health_check))
        .route("/api/scales", get(scales::list_scales))
        .route("/api/scales/:mac", get(scales::get_scale))
        .route("/api/measurements", get(measurements::list_measurements))
        .route(
            "/api/measurements/latest",
            get(measurements::latest_measurement),
        )
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/:id", delete(users::delete_user))
        .route("/api/raw-uploads", get(raw_uploads::list_raw_uploads));

    Router::new()
        .merge(scale_routes)
        .merge(management_routes)
        .fallback(scale::catch_all)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

use anyhow::Result;
use tracing::info;

use aria_api::{app, config::Config, middleware};
use protocol::WeightUnit;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    middleware::logging::init_logging(&config);

    info!("Starting aria-api v{}", env!("CARGO_PKG_VERSION"));

    let unit: WeightUnit = config.weight_unit.parse().map_err(anyhow::Error::msg)?;
    info!(unit = unit.as_str(), "weight unit configured");

    // A dead store at startup is fatal; once serving, outages surface as
    // 503s and the scale retries on its own.
    let pool = persistence::db::create_pool(&config.database_config()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations").run(&pool).await?;
    info!("Migrations completed");

    let app = app::create_app(config.clone(), pool);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

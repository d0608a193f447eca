//! Brokerage back-office API server.
//!
//! Main entry point for the back-office HTTP service.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brokerage_api::{AppState, create_router};
use brokerage_core::export::ExportDefaults;
use brokerage_core::user::UserGuard;
use brokerage_db::connect_with;
use brokerage_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "brokerage_api=debug,brokerage_core=debug,brokerage_db=debug,tower_http=debug"
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let defaults = ExportDefaults::try_from(&config.export)?;
    info!(
        format = %defaults.format,
        filename_base = %defaults.filename_base,
        "Export defaults loaded"
    );
    let guard = UserGuard::from_config(&config.users);

    // Create application state and router
    let state = AppState::new(db, defaults, guard);
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

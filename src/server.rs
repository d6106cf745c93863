/// Server setup and initialization
///
/// Wires together storage, the conversion handler, the permission gate and
/// the HTTP routes.

use crate::{
    api::{create_inquiry_routes, create_session_routes, create_student_routes, AppState},
    config::Config,
    crm::{ConversionHandler, CrmStorage},
    database,
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Opens the database, builds shared state and mounts every endpoint.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📁 Using data directory: {}", config.database.data_dir);
    let pool = database::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    let storage = CrmStorage::new(pool.clone());
    let conversions = ConversionHandler::new(pool);

    tracing::info!(
        "🔐 Permission table loaded ({} roles)",
        crate::auth::Role::ALL
            .iter()
            .filter(|role| config.permissions.grants(**role).next().is_some())
            .count()
    );

    let state = AppState {
        storage,
        conversions,
        permissions: Arc::new(config.permissions),
    };

    tracing::info!("✅ Application initialized successfully");

    Ok(build_router(state))
}

/// Mount all routes over an already-built state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        .merge(create_session_routes())
        .merge(create_student_routes())
        .merge(create_inquiry_routes())
        .with_state(state)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing::info!("Starting centerdesk server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

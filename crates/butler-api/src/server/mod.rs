//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use butler_common::{AppConfig, AppError};
use butler_db::{
    create_pool, run_migrations, PgRosterRepository, PgSettingsRepository, PgTaskRepository,
};
use butler_service::ServiceContextBuilder;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router();
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&config.database)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let service_context = ServiceContextBuilder::new()
        .task_repo(Arc::new(PgTaskRepository::new(pool.clone())))
        .roster_repo(Arc::new(PgRosterRepository::new(pool.clone())))
        .settings_repo(Arc::new(PgSettingsRepository::new(pool.clone())))
        .build()
        .map_err(AppError::from)?;

    Ok(AppState::new(service_context, Arc::new(pool)))
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_server(
    app: Router,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::internal(anyhow::anyhow!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::validation(format!("Invalid API address: {e}")))?;

    let state = create_app_state(&config).await?;
    let app = create_app(state);

    run_server(app, addr, shutdown_signal()).await
}

/// Resolves on Ctrl+C
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{health, members, settings, tasks};
use crate::state::AppState;

/// Create the main API router with all routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(task_routes())
        .merge(roster_routes())
        .merge(settings_routes())
}

/// Task queue routes
fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route("/tasks/:task_id", get(tasks::get_task))
}

/// Roster mirror routes
fn roster_routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(members::list_members))
        .route("/members/:member_id", get(members::get_member))
        .route("/roles", get(members::list_roles))
}

/// Settings routes
fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/settings",
        get(settings::get_settings).patch(settings::update_settings),
    )
}

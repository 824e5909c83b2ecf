//! # butler-api
//!
//! Admin REST API built with the Axum framework: task queueing, roster
//! reads, settings and health probes.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, run_server};
pub use state::{AppState, ReadinessProbe};

//! # butler-db
//!
//! Database layer implementing the butler-core repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and the idempotent bootstrap schema
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers (including column arrays for `UNNEST` bulk inserts)
//! - Repository implementations for tasks, the roster mirror and settings
//!
//! ## Usage
//!
//! ```rust,ignore
//! use butler_db::{create_pool, run_migrations, PgTaskRepository};
//!
//! async fn example(config: &butler_common::DatabaseConfig) -> Result<(), sqlx::Error> {
//!     let pool = create_pool(config).await?;
//!     run_migrations(&pool).await?;
//!     let tasks = PgTaskRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use pool::{create_pool, ping, PgPool};
pub use repositories::{PgRosterRepository, PgSettingsRepository, PgTaskRepository};
pub use schema::run_migrations;

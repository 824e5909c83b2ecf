//! # butler-common
//!
//! Shared utilities: environment configuration, application errors, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AntifraudConfig, AntispamConfig, AppConfig, AppSettings, ConfigError, DatabaseConfig,
    DiscordConfig, Environment, LogFormat, RedisConfig, ScheduleConfig, ServerConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{init_tracing, TracingConfig, TracingError};

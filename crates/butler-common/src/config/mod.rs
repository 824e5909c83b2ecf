//! Configuration structs

mod app_config;

pub use app_config::{
    AntifraudConfig, AntispamConfig, AppConfig, AppSettings, ConfigError, DatabaseConfig,
    DiscordConfig, Environment, LogFormat, RedisConfig, ScheduleConfig, ServerConfig,
};

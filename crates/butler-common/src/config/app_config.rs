//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use butler_core::Snowflake;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    /// Absent when no bot token is configured (the admin API runs without it)
    pub discord: Option<DiscordConfig>,
    pub schedule: ScheduleConfig,
    pub antifraud: AntifraudConfig,
    pub antispam: AntispamConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
    pub log_format: LogFormat,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Admin API bind address
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Chat platform connection settings
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: Snowflake,
    pub api_base_url: String,
    pub gateway_url: String,
    pub request_timeout: Duration,
}

/// Intervals of the scheduled units
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub sync_discord: Duration,
    pub activity_scan: Duration,
    pub tasks_scan: Duration,
    pub antifraud_scan: Duration,
}

/// Impersonation scan settings
#[derive(Debug, Clone)]
pub struct AntifraudConfig {
    /// Empty disables the scan
    pub protected_term: String,
    /// Genuine holders of the protected identity
    pub allowed_member_ids: Vec<Snowflake>,
}

/// Spam detector settings
#[derive(Debug, Clone)]
pub struct AntispamConfig {
    pub retention: Duration,
    pub retries_until_mute: usize,
    /// Spam detection is disabled without a mute role
    pub mute_role_id: Option<Snowflake>,
    pub exempt_role_ids: Vec<Snowflake>,
}

// Default value functions
fn default_app_name() -> String {
    "guild-butler".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_sync_discord_seconds() -> u64 {
    60
}

fn default_activity_scan_seconds() -> u64 {
    900
}

fn default_tasks_scan_seconds() -> u64 {
    60
}

fn default_antifraud_scan_seconds() -> u64 {
    60
}

fn default_protected_term() -> String {
    "accountant".to_string()
}

fn default_retention_seconds() -> u64 {
    3600
}

fn default_retries_until_mute() -> usize {
    2
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let env = match vars.get("APP_ENV").map(|s| s.to_lowercase()).as_deref() {
            None | Some("development") => Environment::Development,
            Some("staging") => Environment::Staging,
            Some("production") => Environment::Production,
            Some(other) => return Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        };
        let log_format = match vars.get("LOG_FORMAT").map(|s| s.to_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            None if env.is_production() => LogFormat::Json,
            None => LogFormat::Pretty,
            Some(other) => return Err(ConfigError::InvalidValue("LOG_FORMAT", other.to_string())),
        };

        let discord = match vars.get("DISCORD_TOKEN") {
            Some(token) => Some(DiscordConfig {
                token,
                guild_id: vars.required_parsed("DISCORD_GUILD_ID")?,
                api_base_url: vars
                    .get("DISCORD_API_BASE_URL")
                    .unwrap_or_else(default_api_base_url),
                gateway_url: vars
                    .get("DISCORD_GATEWAY_URL")
                    .unwrap_or_else(default_gateway_url),
                request_timeout: vars.seconds(
                    "DISCORD_REQUEST_TIMEOUT_SECONDS",
                    default_request_timeout_seconds(),
                )?,
            }),
            None => None,
        };

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env,
                log_format,
            },
            api: ServerConfig {
                host: vars.get("API_HOST").unwrap_or_else(default_host),
                port: vars.parsed_or("API_PORT", default_api_port())?,
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars
                    .parsed_or("DATABASE_MAX_CONNECTIONS", default_max_connections())?,
                min_connections: vars
                    .parsed_or("DATABASE_MIN_CONNECTIONS", default_min_connections())?,
            },
            redis: RedisConfig {
                url: vars.required("REDIS_URL")?,
                max_connections: vars
                    .parsed_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections())?,
            },
            discord,
            schedule: ScheduleConfig {
                sync_discord: vars.seconds("SYNC_DISCORD_SECONDS", default_sync_discord_seconds())?,
                activity_scan: vars
                    .seconds("ACTIVITY_SCAN_SECONDS", default_activity_scan_seconds())?,
                tasks_scan: vars.seconds("TASKS_SCAN_SECONDS", default_tasks_scan_seconds())?,
                antifraud_scan: vars
                    .seconds("ANTIFRAUD_SCAN_SECONDS", default_antifraud_scan_seconds())?,
            },
            antifraud: AntifraudConfig {
                protected_term: vars
                    .get("ANTIFRAUD_PROTECTED_TERM")
                    .unwrap_or_else(default_protected_term),
                allowed_member_ids: vars.id_list("ANTIFRAUD_ALLOWED_MEMBER_IDS")?,
            },
            antispam: AntispamConfig {
                retention: vars.seconds("ANTISPAM_RETENTION_SECONDS", default_retention_seconds())?,
                retries_until_mute: vars
                    .parsed_or("ANTISPAM_RETRIES_UNTIL_MUTE", default_retries_until_mute())?,
                mute_role_id: vars.optional_parsed("ANTISPAM_MUTE_ROLE_ID")?,
                exempt_role_ids: vars.id_list("ANTISPAM_EXEMPT_ROLE_IDS")?,
            },
        })
    }

    /// Platform settings, required by the worker binary
    pub fn require_discord(&self) -> Result<&DiscordConfig, ConfigError> {
        self.discord
            .as_ref()
            .ok_or(ConfigError::MissingVar("DISCORD_TOKEN"))
    }
}

/// Typed access to raw variables; blank values count as unset
struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingVar(key))
    }

    fn optional_parsed<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ConfigError::InvalidValue(key, raw.clone()))
            })
            .transpose()
    }

    fn required_parsed<T: FromStr>(&self, key: &'static str) -> Result<T, ConfigError> {
        self.optional_parsed(key)?
            .ok_or(ConfigError::MissingVar(key))
    }

    fn parsed_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        Ok(self.optional_parsed(key)?.unwrap_or(default))
    }

    fn seconds(&self, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
        let seconds: u64 = self.parsed_or(key, default)?;
        if seconds == 0 {
            return Err(ConfigError::InvalidValue(key, "0".to_string()));
        }
        Ok(Duration::from_secs(seconds))
    }

    fn id_list(&self, key: &'static str) -> Result<Vec<Snowflake>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                Snowflake::parse(part).map_err(|_| ConfigError::InvalidValue(key, part.to_string()))
            })
            .collect()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

//! Moderation worker entry point
//!
//! Run with:
//! ```bash
//! cargo run -p butler-bot
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use butler_common::{init_tracing, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(TracingConfig::for_app(&config.app)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(env = ?config.app.env, "Starting moderation worker");

    if let Err(e) = butler_bot::run(config).await {
        error!(error = %format!("{e:#}"), "Worker failed");
        std::process::exit(1);
    }
}

//! Test helpers for integration tests
//!
//! Spawns the admin API on an ephemeral port, either over in-memory
//! repositories or over a real database, and offers HTTP shortcuts.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use butler_api::{create_app, create_app_state, AppState, ReadinessProbe};
use butler_common::AppConfig;
use butler_service::ServiceContextBuilder;

use crate::fakes::{
    InMemoryRosterRepository, InMemorySettingsRepository, InMemoryTaskRepository, StaticProbe,
};

/// Repositories behind an in-memory server, kept for assertions
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    pub tasks: Arc<InMemoryTaskRepository>,
    pub roster: Arc<InMemoryRosterRepository>,
    pub settings: Arc<InMemorySettingsRepository>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// App state over these repositories
    pub fn app_state(&self, probe: Arc<dyn ReadinessProbe>) -> Result<AppState> {
        let context = ServiceContextBuilder::new()
            .task_repo(self.tasks.clone())
            .roster_repo(self.roster.clone())
            .settings_repo(self.settings.clone())
            .build()?;
        Ok(AppState::new(context, probe))
    }
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server over in-memory repositories with a ready database
    pub async fn start_in_memory(backend: &InMemoryBackend) -> Result<Self> {
        Self::start_with_state(backend.app_state(Arc::new(StaticProbe(true)))?).await
    }

    /// Start a server against the database named by the environment
    pub async fn start() -> Result<Self> {
        let config = test_config()?;
        let state = create_app_state(&config).await?;
        Self::start_with_state(state).await
    }

    /// Start a server with prepared state
    pub async fn start_with_state(state: AppState) -> Result<Self> {
        let app = create_app(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a PATCH request with JSON body
    pub async fn patch<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.patch(&url).json(body).send().await?)
    }
}

/// Create a test configuration
pub fn test_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    Ok(config)
}

/// Helper to check if test environment is available
pub fn check_test_env() -> bool {
    dotenvy::dotenv().ok();

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status only
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}

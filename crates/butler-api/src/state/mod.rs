//! Application state
//!
//! Holds the shared state for the Axum application: the service context
//! and the probe backing the readiness endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use butler_db::PgPool;
use butler_service::ServiceContext;

/// Dependency check behind `/health/ready`
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Whether the database answers
    async fn database(&self) -> bool;
}

#[async_trait]
impl ReadinessProbe for PgPool {
    async fn database(&self) -> bool {
        butler_db::ping(self).await.is_ok()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service_context: Arc<ServiceContext>,
    probe: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service_context: ServiceContext, probe: Arc<dyn ReadinessProbe>) -> Self {
        Self {
            service_context: Arc::new(service_context),
            probe,
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the readiness probe
    pub fn probe(&self) -> &dyn ReadinessProbe {
        self.probe.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &self.service_context)
            .field("probe", &"ReadinessProbe")
            .finish()
    }
}

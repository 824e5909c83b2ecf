//! Path parameter extractors

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use butler_core::Snowflake;

use crate::response::ApiError;

/// Numeric task id from `/tasks/:task_id`
#[derive(Debug, Clone, Copy)]
pub struct TaskIdPath(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for TaskIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.body_text()))?;

        raw.parse()
            .map(TaskIdPath)
            .map_err(|_| ApiError::invalid_path("Invalid task_id format"))
    }
}

/// Snowflake id from a single-segment path such as `/members/:member_id`
#[derive(Debug, Clone, Copy)]
pub struct SnowflakePath(pub Snowflake);

#[async_trait]
impl<S> FromRequestParts<S> for SnowflakePath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.body_text()))?;

        raw.parse()
            .map(SnowflakePath)
            .map_err(|_| ApiError::invalid_path("Invalid id format"))
    }
}

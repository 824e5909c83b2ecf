//! Settings handlers

use axum::{extract::State, Json};
use butler_service::dto::{ApiResponse, SettingsResponse, UpdateSettingsRequest};
use butler_service::SettingsService;

use crate::extractors::ValidatedJson;
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<SettingsResponse>>> {
    let service = SettingsService::new(state.service_context());
    Ok(Json(ApiResponse::new(service.get_settings().await?)))
}

/// PATCH /settings
pub async fn update_settings(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<UpdateSettingsRequest>,
) -> ApiResult<Json<ApiResponse<SettingsResponse>>> {
    let service = SettingsService::new(state.service_context());
    Ok(Json(ApiResponse::new(service.update_settings(request).await?)))
}

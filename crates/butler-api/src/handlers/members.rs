//! Roster handlers
//!
//! Read-only endpoints over the mirrored members and roles.

use axum::{extract::State, Json};
use butler_service::dto::{ApiResponse, MemberQuery, MemberResponse, PageResponse, RoleResponse};
use butler_service::RosterService;

use crate::extractors::{SnowflakePath, ValidatedQuery};
use crate::response::ApiResult;
use crate::state::AppState;

/// List members
///
/// GET /members?search=&role_id=&bot=&min_engagement=&limit=&offset=
pub async fn list_members(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MemberQuery>,
) -> ApiResult<Json<PageResponse<MemberResponse>>> {
    let service = RosterService::new(state.service_context());
    Ok(Json(service.list_members(query).await?))
}

/// Get a member
///
/// GET /members/{member_id}
pub async fn get_member(
    State(state): State<AppState>,
    SnowflakePath(member_id): SnowflakePath,
) -> ApiResult<Json<ApiResponse<MemberResponse>>> {
    let service = RosterService::new(state.service_context());
    let member = service.get_member(member_id).await?;
    Ok(Json(ApiResponse::new(member)))
}

/// List roles
///
/// GET /roles
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<RoleResponse>>>> {
    let service = RosterService::new(state.service_context());
    let roles = service.list_roles().await?;
    Ok(Json(ApiResponse::new(roles)))
}

//! Roster service
//!
//! Read access to the mirrored members and roles.

use tracing::instrument;
use validator::Validate;

use butler_core::{MemberFilter, Snowflake};

use crate::dto::{MemberQuery, MemberResponse, PageResponse, RoleResponse, DEFAULT_PAGE_LIMIT};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Roster service
pub struct RosterService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RosterService<'a> {
    /// Create a new RosterService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// List mirrored members matching the query
    #[instrument(skip(self))]
    pub async fn list_members(&self, query: MemberQuery) -> ServiceResult<PageResponse<MemberResponse>> {
        query
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let filter = MemberFilter {
            search: query.search,
            role_id: query.role_id,
            bot: query.bot,
            min_engagement: query.min_engagement,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            offset: query.offset.unwrap_or(0),
        };
        let members = self.ctx.roster_repo().list_members(&filter).await?;

        Ok(PageResponse::new(
            members.iter().map(MemberResponse::from).collect(),
            filter.limit,
            filter.offset,
        ))
    }

    /// Get a mirrored member by ID
    #[instrument(skip(self))]
    pub async fn get_member(&self, member_id: Snowflake) -> ServiceResult<MemberResponse> {
        let member = self
            .ctx
            .roster_repo()
            .find_member(member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member", member_id.to_string()))?;

        Ok(MemberResponse::from(&member))
    }

    /// List mirrored roles, highest first
    #[instrument(skip(self))]
    pub async fn list_roles(&self) -> ServiceResult<Vec<RoleResponse>> {
        let roles = self.ctx.roster_repo().list_roles().await?;
        Ok(roles.iter().map(RoleResponse::from).collect())
    }
}

//! PostgreSQL implementation of RosterRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use butler_core::entities::{MemberFilter, MirrorMember, MirrorRole};
use butler_core::traits::{RepoResult, RosterRepository};
use butler_core::value_objects::Snowflake;

use crate::mappers::{member_role_links, MemberColumns, RoleColumns};
use crate::models::{MirrorMemberModel, MirrorRoleModel};

use super::error::map_db_error;

const MEMBER_SELECT: &str = r#"
    SELECT m.id, m.bot, m.avatar_url, m.name, m.username, m.discriminator, m.nick,
           m.engagement_score, m.messages_count, m.age_of_account, m.pending,
           m.premium_since, m.joined_at, m.created_at,
           COALESCE(
               array_agg(mr.role_id ORDER BY mr.role_id) FILTER (WHERE mr.role_id IS NOT NULL),
               '{}'
           ) AS role_ids
    FROM mirror_members m
    LEFT JOIN mirror_member_roles mr ON mr.member_id = m.id
"#;

/// PostgreSQL implementation of RosterRepository
#[derive(Clone)]
pub struct PgRosterRepository {
    pool: PgPool,
}

impl PgRosterRepository {
    /// Create a new PgRosterRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%term%` for ILIKE, with the pattern metacharacters escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl RosterRepository for PgRosterRepository {
    #[instrument(skip(self, roles, members), fields(roles = roles.len(), members = members.len()))]
    async fn replace_all(&self, roles: &[MirrorRole], members: &[MirrorMember]) -> RepoResult<()> {
        let role_columns = RoleColumns::new(roles);
        let member_columns = MemberColumns::new(members);
        let (link_members, link_roles) = member_role_links(members);

        // Dropping the transaction without commit rolls everything back
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM mirror_member_roles")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        sqlx::query("DELETE FROM mirror_members")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        sqlx::query("DELETE FROM mirror_roles")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO mirror_roles (id, name, position, created_at)
            SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::int[], $4::timestamptz[])
            "#,
        )
        .bind(&role_columns.ids)
        .bind(&role_columns.names)
        .bind(&role_columns.positions)
        .bind(&role_columns.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO mirror_members (
                id, bot, avatar_url, name, username, discriminator, nick,
                engagement_score, messages_count, age_of_account, pending,
                premium_since, joined_at, created_at
            )
            SELECT * FROM UNNEST(
                $1::bigint[], $2::boolean[], $3::text[], $4::text[], $5::text[], $6::text[],
                $7::text[], $8::smallint[], $9::bigint[], $10::text[], $11::boolean[],
                $12::timestamptz[], $13::timestamptz[], $14::timestamptz[]
            )
            "#,
        )
        .bind(&member_columns.ids)
        .bind(&member_columns.bots)
        .bind(&member_columns.avatar_urls)
        .bind(&member_columns.names)
        .bind(&member_columns.usernames)
        .bind(&member_columns.discriminators)
        .bind(&member_columns.nicks)
        .bind(&member_columns.engagement_scores)
        .bind(&member_columns.messages_counts)
        .bind(&member_columns.ages_of_account)
        .bind(&member_columns.pendings)
        .bind(&member_columns.premium_since)
        .bind(&member_columns.joined_at)
        .bind(&member_columns.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        // Links to roles outside the mirrored set (e.g. @everyone) are dropped
        let links = sqlx::query(
            r#"
            INSERT INTO mirror_member_roles (member_id, role_id)
            SELECT DISTINCT l.member_id, l.role_id
            FROM UNNEST($1::bigint[], $2::bigint[]) AS l(member_id, role_id)
            JOIN mirror_roles r ON r.id = l.role_id
            "#,
        )
        .bind(&link_members)
        .bind(&link_roles)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        debug!(links = links.rows_affected(), "Roster mirror replaced");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_members(&self, filter: &MemberFilter) -> RepoResult<Vec<MirrorMember>> {
        let results = sqlx::query_as::<_, MirrorMemberModel>(&format!(
            r#"
            {MEMBER_SELECT}
            WHERE ($1::text IS NULL
                   OR m.name ILIKE $1 OR m.username ILIKE $1 OR m.nick ILIKE $1)
              AND ($2::bigint IS NULL OR EXISTS(
                   SELECT 1 FROM mirror_member_roles f
                   WHERE f.member_id = m.id AND f.role_id = $2))
              AND ($3::boolean IS NULL OR m.bot = $3)
              AND ($4::smallint IS NULL OR m.engagement_score >= $4)
            GROUP BY m.id
            ORDER BY m.created_at, m.id
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(filter.search.as_deref().map(like_pattern))
        .bind(filter.role_id.map(Snowflake::into_inner))
        .bind(filter.bot)
        .bind(filter.min_engagement)
        .bind(filter.limit.clamp(1, 1000))
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(MirrorMember::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_member(&self, id: Snowflake) -> RepoResult<Option<MirrorMember>> {
        let result = sqlx::query_as::<_, MirrorMemberModel>(&format!(
            "{MEMBER_SELECT} WHERE m.id = $1 GROUP BY m.id"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(MirrorMember::from))
    }

    #[instrument(skip(self))]
    async fn list_roles(&self) -> RepoResult<Vec<MirrorRole>> {
        let results = sqlx::query_as::<_, MirrorRoleModel>(
            r#"
            SELECT id, name, position, created_at
            FROM mirror_roles
            ORDER BY position DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(MirrorRole::from).collect())
    }
}

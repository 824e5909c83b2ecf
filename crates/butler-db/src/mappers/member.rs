//! Mirrored member entity <-> model mapper

use chrono::{DateTime, Utc};

use butler_core::entities::MirrorMember;
use butler_core::value_objects::Snowflake;

use crate::models::MirrorMemberModel;

impl From<MirrorMemberModel> for MirrorMember {
    fn from(model: MirrorMemberModel) -> Self {
        MirrorMember {
            id: Snowflake::new(model.id),
            bot: model.bot,
            avatar_url: model.avatar_url,
            name: model.name,
            username: model.username,
            discriminator: model.discriminator,
            nick: model.nick,
            engagement_score: model.engagement_score,
            messages_count: model.messages_count,
            age_of_account: model.age_of_account,
            pending: model.pending,
            premium_since: model.premium_since,
            joined_at: model.joined_at,
            created_at: model.created_at,
            role_ids: model.role_ids.into_iter().map(Snowflake::new).collect(),
        }
    }
}

/// Column-oriented member rows for an `UNNEST` bulk insert
#[derive(Debug, Default)]
pub struct MemberColumns {
    pub ids: Vec<i64>,
    pub bots: Vec<bool>,
    pub avatar_urls: Vec<String>,
    pub names: Vec<String>,
    pub usernames: Vec<String>,
    pub discriminators: Vec<String>,
    pub nicks: Vec<Option<String>>,
    pub engagement_scores: Vec<i16>,
    pub messages_counts: Vec<i64>,
    pub ages_of_account: Vec<String>,
    pub pendings: Vec<bool>,
    pub premium_since: Vec<Option<DateTime<Utc>>>,
    pub joined_at: Vec<Option<DateTime<Utc>>>,
    pub created_at: Vec<DateTime<Utc>>,
}

impl MemberColumns {
    pub fn new(members: &[MirrorMember]) -> Self {
        let mut columns = Self::default();
        for member in members {
            columns.ids.push(member.id.into_inner());
            columns.bots.push(member.bot);
            columns.avatar_urls.push(member.avatar_url.clone());
            columns.names.push(member.name.clone());
            columns.usernames.push(member.username.clone());
            columns.discriminators.push(member.discriminator.clone());
            columns.nicks.push(member.nick.clone());
            columns.engagement_scores.push(member.engagement_score);
            columns.messages_counts.push(member.messages_count);
            columns.ages_of_account.push(member.age_of_account.clone());
            columns.pendings.push(member.pending);
            columns.premium_since.push(member.premium_since);
            columns.joined_at.push(member.joined_at);
            columns.created_at.push(member.created_at);
        }
        columns
    }
}

/// (member, role) link pairs, flattened into two parallel columns
pub fn member_role_links(members: &[MirrorMember]) -> (Vec<i64>, Vec<i64>) {
    members
        .iter()
        .flat_map(|member| {
            member
                .role_ids
                .iter()
                .map(move |role_id| (member.id.into_inner(), role_id.into_inner()))
        })
        .unzip()
}

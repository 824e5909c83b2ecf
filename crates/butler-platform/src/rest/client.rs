//! REST adapter implementing [`PlatformClient`]

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use butler_common::DiscordConfig;
use butler_core::{
    PlatformChannel, PlatformClient, PlatformError, PlatformMember, PlatformMessage, PlatformResult,
    PlatformRole, Snowflake,
};

use crate::models::{
    ApiErrorPayload, ChannelPayload, CreateBanBody, CreateDmBody, CreateMessageBody, MemberPayload,
    MessagePayload, RolePayload,
};

use super::error::{map_error_response, map_transport_error};

/// Header carrying the reason shown in the guild's audit log
const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// 429 responses retried before giving up with `RateLimited`
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Longest single rate-limit wait honoured
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

const MEMBERS_PAGE_SIZE: usize = 1000;
const HISTORY_PAGE_SIZE: usize = 100;

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/guild-butler, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// HTTP client for one guild
///
/// Members seen through [`PlatformClient::members`] or resolved remotely are kept
/// in a local cache so moderation passes avoid one request per member. Every
/// complete member listing replaces the cache, and members the API reports as
/// unknown are evicted.
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
    guild_id: Snowflake,
    members: DashMap<Snowflake, PlatformMember>,
}

impl DiscordClient {
    /// Build a client from the connection settings
    pub fn new(config: &DiscordConfig) -> PlatformResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bot {}", config.token))
            .map_err(|_| PlatformError::Transport("bot token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(map_transport_error)?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            guild_id: config.guild_id,
            members: DashMap::new(),
        })
    }

    /// Number of members currently cached
    pub fn cached_members(&self) -> usize {
        self.members.len()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request, waiting out rate limits a bounded number of times
    ///
    /// `build` is called once per attempt since a sent request is consumed.
    async fn execute<F>(&self, resource: &'static str, build: F) -> PlatformResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder + Sync,
    {
        let mut retries = 0;
        loop {
            let response = build(&self.http).send().await.map_err(map_transport_error)?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let body = response.json::<ApiErrorPayload>().await.ok();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let seconds = body.as_ref().and_then(|b| b.retry_after).unwrap_or(1.0);
                let retry_after = Duration::from_secs_f64(seconds.max(0.0)).min(MAX_RETRY_AFTER);
                if retries >= MAX_RATE_LIMIT_RETRIES {
                    return Err(PlatformError::RateLimited { retry_after });
                }
                retries += 1;
                warn!(resource, ?retry_after, retries, "Rate limited, waiting before retry");
                tokio::time::sleep(retry_after).await;
                continue;
            }

            return Err(map_error_response(status, body, resource));
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: &'static str,
    ) -> PlatformResult<T> {
        let url = self.url(path);
        let response = self
            .execute(resource, |http| http.get(&url).query(query))
            .await?;
        response.json::<T>().await.map_err(map_transport_error)
    }

    fn cache_member(&self, member: &PlatformMember) {
        self.members.insert(member.id, member.clone());
    }

    /// Drop a member the API no longer knows about
    fn evict_if_gone(&self, member_id: Snowflake, err: &PlatformError) {
        if err.is_member_gone() && self.members.remove(&member_id).is_some() {
            debug!(member_id = %member_id, "Evicted departed member from cache");
        }
    }
}

#[async_trait]
impl PlatformClient for DiscordClient {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    #[instrument(skip(self))]
    async fn fetch_roles(&self) -> PlatformResult<Vec<PlatformRole>> {
        let roles: Vec<RolePayload> = self
            .get_json(&format!("/guilds/{}/roles", self.guild_id), &[], "guild")
            .await?;
        Ok(roles.into_iter().map(PlatformRole::from).collect())
    }

    fn members(&self) -> BoxStream<'_, PlatformResult<PlatformMember>> {
        let path = format!("/guilds/{}/members", self.guild_id);

        // State: cursor of the next page (`None` once a short page was seen)
        // and the ids listed so far
        let start = (Some(Snowflake::default()), HashSet::new());
        stream::try_unfold(start, move |(cursor, mut seen)| {
            let path = path.clone();
            async move {
                let Some(after) = cursor else {
                    return Ok(None);
                };
                let query = [
                    ("limit", MEMBERS_PAGE_SIZE.to_string()),
                    ("after", after.to_string()),
                ];
                let page: Vec<MemberPayload> = self.get_json(&path, &query, "guild").await?;
                debug!(after = %after, count = page.len(), "Fetched member page");

                let next = if page.len() < MEMBERS_PAGE_SIZE {
                    None
                } else {
                    page.last().map(|member| member.user.id)
                };
                let members: Vec<PlatformMember> =
                    page.into_iter().map(PlatformMember::from).collect();
                for member in &members {
                    self.cache_member(member);
                    seen.insert(member.id);
                }
                if next.is_none() {
                    // Complete listing: anyone not in it has left
                    self.members.retain(|id, _| seen.contains(id));
                }
                Ok::<_, PlatformError>(Some((members, (next, seen))))
            }
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    #[instrument(skip(self))]
    async fn fetch_channels(&self) -> PlatformResult<Vec<PlatformChannel>> {
        let channels: Vec<ChannelPayload> = self
            .get_json(&format!("/guilds/{}/channels", self.guild_id), &[], "guild")
            .await?;
        Ok(channels.into_iter().map(PlatformChannel::from).collect())
    }

    fn channel_history(
        &self,
        channel_id: Snowflake,
    ) -> BoxStream<'_, PlatformResult<PlatformMessage>> {
        let path = format!("/channels/{channel_id}/messages");
        let guild_id = self.guild_id;

        // Outer `None` ends the stream; inner is the `before` cursor
        stream::try_unfold(Some(None::<Snowflake>), move |cursor| {
            let path = path.clone();
            async move {
                let Some(before) = cursor else {
                    return Ok(None);
                };
                let mut query = vec![("limit", HISTORY_PAGE_SIZE.to_string())];
                if let Some(before) = before {
                    query.push(("before", before.to_string()));
                }
                let page: Vec<MessagePayload> = self.get_json(&path, &query, "channel").await?;

                let next = if page.len() < HISTORY_PAGE_SIZE {
                    None
                } else {
                    page.last().map(|message| Some(message.id))
                };
                let messages: Vec<PlatformMessage> = page
                    .into_iter()
                    .map(|message| message.into_message(Some(guild_id)))
                    .collect();
                Ok::<_, PlatformError>(Some((messages, next)))
            }
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    #[instrument(skip(self))]
    async fn fetch_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<PlatformMessage> {
        let message: MessagePayload = self
            .get_json(
                &format!("/channels/{channel_id}/messages/{message_id}"),
                &[],
                "message",
            )
            .await?;
        Ok(message.into_message(Some(self.guild_id)))
    }

    #[instrument(skip(self))]
    async fn resolve_member(&self, member_id: Snowflake) -> PlatformResult<PlatformMember> {
        let cached = self.members.get(&member_id).map(|member| member.clone());
        if let Some(member) = cached {
            return Ok(member);
        }

        let payload: MemberPayload = self
            .get_json(
                &format!("/guilds/{}/members/{member_id}", self.guild_id),
                &[],
                "member",
            )
            .await
            .inspect_err(|e| self.evict_if_gone(member_id, e))?;
        let member = PlatformMember::from(payload);
        self.cache_member(&member);
        Ok(member)
    }

    #[instrument(skip(self))]
    async fn kick(&self, member_id: Snowflake, reason: &str) -> PlatformResult<()> {
        let url = self.url(&format!("/guilds/{}/members/{member_id}", self.guild_id));
        self.execute("member", |http| {
            http.delete(&url).header(AUDIT_LOG_REASON, reason)
        })
        .await
        .inspect_err(|e| self.evict_if_gone(member_id, e))?;
        self.members.remove(&member_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn ban(
        &self,
        member_id: Snowflake,
        delete_message_days: u8,
        reason: &str,
    ) -> PlatformResult<()> {
        let url = self.url(&format!("/guilds/{}/bans/{member_id}", self.guild_id));
        let body = CreateBanBody::from_days(delete_message_days);
        self.execute("member", |http| {
            http.put(&url).header(AUDIT_LOG_REASON, reason).json(&body)
        })
        .await
        .inspect_err(|e| self.evict_if_gone(member_id, e))?;
        self.members.remove(&member_id);
        Ok(())
    }

    #[instrument(skip(self, role_ids), fields(roles = role_ids.len()))]
    async fn add_roles(
        &self,
        member_id: Snowflake,
        role_ids: &[Snowflake],
        reason: &str,
    ) -> PlatformResult<()> {
        for role_id in role_ids {
            let url = self.url(&format!(
                "/guilds/{}/members/{member_id}/roles/{role_id}",
                self.guild_id
            ));
            self.execute("member", |http| {
                http.put(&url).header(AUDIT_LOG_REASON, reason)
            })
            .await
            .inspect_err(|e| self.evict_if_gone(member_id, e))?;

            if let Some(mut member) = self.members.get_mut(&member_id) {
                if !member.has_role(*role_id) {
                    member.role_ids.push(*role_id);
                }
            }
        }
        Ok(())
    }

    #[instrument(skip(self, role_ids), fields(roles = role_ids.len()))]
    async fn remove_roles(
        &self,
        member_id: Snowflake,
        role_ids: &[Snowflake],
        reason: &str,
    ) -> PlatformResult<()> {
        for role_id in role_ids {
            let url = self.url(&format!(
                "/guilds/{}/members/{member_id}/roles/{role_id}",
                self.guild_id
            ));
            self.execute("member", |http| {
                http.delete(&url).header(AUDIT_LOG_REASON, reason)
            })
            .await
            .inspect_err(|e| self.evict_if_gone(member_id, e))?;

            if let Some(mut member) = self.members.get_mut(&member_id) {
                member.role_ids.retain(|id| id != role_id);
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<()> {
        let url = self.url(&format!("/channels/{channel_id}/messages/{message_id}"));
        self.execute("message", |http| http.delete(&url)).await?;
        Ok(())
    }

    #[instrument(skip(self, content))]
    async fn send_direct_message(&self, user_id: Snowflake, content: &str) -> PlatformResult<()> {
        let url = self.url("/users/@me/channels");
        let body = CreateDmBody {
            recipient_id: user_id,
        };
        let channel: ChannelPayload = self
            .execute("user", |http| http.post(&url).json(&body))
            .await?
            .json()
            .await
            .map_err(map_transport_error)?;

        let url = self.url(&format!("/channels/{}/messages", channel.id));
        let body = CreateMessageBody { content };
        self.execute("channel", |http| http.post(&url).json(&body))
            .await?;
        Ok(())
    }
}

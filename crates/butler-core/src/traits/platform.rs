//! Platform client trait - the moderation surface of the chat platform

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::entities::{PlatformChannel, PlatformMember, PlatformMessage, PlatformRole};
use crate::error::PlatformResult;
use crate::value_objects::Snowflake;

/// Operations the worker needs from the chat platform, scoped to one guild
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// The managed guild
    fn guild_id(&self) -> Snowflake;

    /// Every role of the guild, including @everyone
    async fn fetch_roles(&self) -> PlatformResult<Vec<PlatformRole>>;

    /// Every member of the guild, fetched page by page
    fn members(&self) -> BoxStream<'_, PlatformResult<PlatformMember>>;

    /// Every channel of the guild
    async fn fetch_channels(&self) -> PlatformResult<Vec<PlatformChannel>>;

    /// Full history of a channel, newest first. May yield `Forbidden`.
    fn channel_history(&self, channel_id: Snowflake)
        -> BoxStream<'_, PlatformResult<PlatformMessage>>;

    /// A single message
    async fn fetch_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<PlatformMessage>;

    /// Resolve a member, local cache first. `NotFound` when not in the guild.
    async fn resolve_member(&self, member_id: Snowflake) -> PlatformResult<PlatformMember>;

    /// Remove a member from the guild
    async fn kick(&self, member_id: Snowflake, reason: &str) -> PlatformResult<()>;

    /// Ban a member, purging `delete_message_days` of their messages
    async fn ban(
        &self,
        member_id: Snowflake,
        delete_message_days: u8,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Grant every role in `role_ids`
    async fn add_roles(
        &self,
        member_id: Snowflake,
        role_ids: &[Snowflake],
        reason: &str,
    ) -> PlatformResult<()>;

    /// Revoke every role in `role_ids`
    async fn remove_roles(
        &self,
        member_id: Snowflake,
        role_ids: &[Snowflake],
        reason: &str,
    ) -> PlatformResult<()>;

    /// Delete a message
    async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<()>;

    /// Send a direct message to a user
    async fn send_direct_message(&self, user_id: Snowflake, content: &str)
        -> PlatformResult<()>;
}

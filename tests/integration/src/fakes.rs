//! In-memory implementations of the storage, cache and platform ports

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;

use butler_api::ReadinessProbe;
use butler_core::analysis::contains_ignore_case;
use butler_core::{
    CachedMessage, CachedMessageKey, DomainError, MemberFilter, MessageCache, MirrorMember,
    MirrorRole, NewTask, PlatformChannel, PlatformClient, PlatformError, PlatformMember,
    PlatformMessage, PlatformResult, PlatformRole, RepoResult, RosterRepository, Settings,
    SettingsRepository, Snowflake, Task, TaskRepository, TaskStatus, TaskType,
};

// ============================================================================
// Task Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<BTreeMap<i64, Task>>,
    next_id: AtomicI64,
    fail_completion: AtomicBool,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored task, oldest first
    pub fn all(&self) -> Vec<Task> {
        self.tasks.lock().values().cloned().collect()
    }

    /// Make every following `mark_finished`/`mark_failed` fail with a store error
    pub fn fail_completion(&self, fail: bool) {
        self.fail_completion.store(fail, Ordering::SeqCst);
    }

    fn advance(
        &self,
        id: i64,
        from: TaskStatus,
        to: TaskStatus,
        error: Option<&str>,
    ) -> RepoResult<bool> {
        from.ensure_transition(to)?;
        if to.is_terminal() && self.fail_completion.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("connection closed".to_string()));
        }

        let mut tasks = self.tasks.lock();
        Ok(match tasks.get_mut(&id) {
            Some(task) if task.status == from => {
                task.status = to;
                if let Some(error) = error {
                    task.error = Some(error.to_string());
                }
                task.modified_at = Utc::now();
                true
            }
            _ => false,
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &NewTask) -> RepoResult<Task> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let task = Task {
            id,
            task_type: task.task_type,
            member_ids: task.member_ids.clone(),
            role_ids: task.role_ids.clone(),
            status: TaskStatus::InQueue,
            error: None,
            created_at: now,
            modified_at: now,
        };
        self.tasks.lock().insert(id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Task>> {
        Ok(self.tasks.lock().get(&id).cloned())
    }

    async fn list(
        &self,
        status: Option<TaskStatus>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .values()
            .rev()
            .filter(|task| status.map_or(true, |status| task.status == status))
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn find_by_status(&self, status: TaskStatus) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .values()
            .filter(|task| task.status == status)
            .cloned()
            .collect())
    }

    async fn mark_started(&self, id: i64) -> RepoResult<bool> {
        self.advance(id, TaskStatus::InQueue, TaskStatus::Started, None)
    }

    async fn mark_finished(&self, id: i64) -> RepoResult<bool> {
        self.advance(id, TaskStatus::Started, TaskStatus::Finished, None)
    }

    async fn mark_failed(&self, id: i64, error: &str) -> RepoResult<bool> {
        self.advance(id, TaskStatus::Started, TaskStatus::Failed, Some(error))
    }

    async fn exists_matching(
        &self,
        task_type: TaskType,
        member_ids: &[Snowflake],
    ) -> RepoResult<bool> {
        let mut wanted = member_ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        Ok(self.tasks.lock().values().any(|task| {
            let mut ids = task.member_ids.clone();
            ids.sort_unstable();
            ids.dedup();
            task.task_type == task_type && ids == wanted
        }))
    }
}

// ============================================================================
// Roster Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryRosterRepository {
    state: Mutex<(Vec<MirrorRole>, Vec<MirrorMember>)>,
    fail_writes: AtomicBool,
}

impl InMemoryRosterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `replace_all` fail without touching the mirror
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn roles(&self) -> Vec<MirrorRole> {
        self.state.lock().0.clone()
    }

    pub fn members(&self) -> Vec<MirrorMember> {
        self.state.lock().1.clone()
    }
}

#[async_trait]
impl RosterRepository for InMemoryRosterRepository {
    async fn replace_all(&self, roles: &[MirrorRole], members: &[MirrorMember]) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("connection reset".to_string()));
        }
        *self.state.lock() = (roles.to_vec(), members.to_vec());
        Ok(())
    }

    async fn list_members(&self, filter: &MemberFilter) -> RepoResult<Vec<MirrorMember>> {
        let mut members: Vec<MirrorMember> = self
            .state
            .lock()
            .1
            .iter()
            .filter(|member| {
                filter.search.as_deref().map_or(true, |search| {
                    contains_ignore_case(&member.name, search)
                        || contains_ignore_case(&member.username, search)
                        || member
                            .nick
                            .as_deref()
                            .is_some_and(|nick| contains_ignore_case(nick, search))
                })
            })
            .filter(|member| filter.role_id.map_or(true, |role| member.has_role(role)))
            .filter(|member| filter.bot.map_or(true, |bot| member.bot == bot))
            .filter(|member| {
                filter
                    .min_engagement
                    .map_or(true, |min| member.engagement_score >= min)
            })
            .cloned()
            .collect();
        members.sort_by_key(|member| member.created_at);

        Ok(members
            .into_iter()
            .skip(usize::try_from(filter.offset).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(0))
            .collect())
    }

    async fn find_member(&self, id: Snowflake) -> RepoResult<Option<MirrorMember>> {
        Ok(self.state.lock().1.iter().find(|m| m.id == id).cloned())
    }

    async fn list_roles(&self) -> RepoResult<Vec<MirrorRole>> {
        let mut roles = self.state.lock().0.clone();
        roles.sort_by(|a, b| b.position.cmp(&a.position));
        Ok(roles)
    }
}

// ============================================================================
// Settings Repository
// ============================================================================

#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: Mutex<Option<Settings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_days(days: i16) -> Self {
        let settings = Settings {
            delete_message_days_when_banned: days,
            ..Settings::default()
        };
        Self {
            settings: Mutex::new(Some(settings)),
        }
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get_or_create(&self) -> RepoResult<Settings> {
        Ok(self.settings.lock().get_or_insert_with(Settings::default).clone())
    }

    async fn update(&self, settings: &Settings) -> RepoResult<Settings> {
        let mut stored = settings.clone();
        stored.modified_at = Utc::now();
        *self.settings.lock() = Some(stored.clone());
        Ok(stored)
    }
}

// ============================================================================
// Message Cache
// ============================================================================

#[derive(Default)]
pub struct InMemoryMessageCache {
    entries: Mutex<HashMap<CachedMessageKey, (CachedMessage, Duration)>>,
    index_created: AtomicUsize,
}

impl InMemoryMessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: CachedMessageKey) -> bool {
        self.entries.lock().contains_key(&key)
    }

    /// TTL the entry was stored with
    pub fn ttl(&self, key: CachedMessageKey) -> Option<Duration> {
        self.entries.lock().get(&key).map(|(_, ttl)| *ttl)
    }

    pub fn index_created(&self) -> usize {
        self.index_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageCache for InMemoryMessageCache {
    async fn ensure_index(&self) -> RepoResult<()> {
        self.index_created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn put(&self, key: CachedMessageKey, entry: &CachedMessage, ttl: Duration) -> RepoResult<()> {
        self.entries.lock().insert(key, (entry.clone(), ttl));
        Ok(())
    }

    async fn find_duplicates(
        &self,
        content: &str,
        author_id: Snowflake,
    ) -> RepoResult<Vec<CachedMessageKey>> {
        let mut keys: Vec<CachedMessageKey> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, (entry, _))| entry.author_id == author_id && entry.content == content)
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, keys: &[CachedMessageKey]) -> RepoResult<()> {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}

// ============================================================================
// Platform
// ============================================================================

/// A side effect performed against the fake platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformAction {
    Kick(Snowflake),
    Ban { member_id: Snowflake, delete_message_days: u8 },
    AddRoles { member_id: Snowflake, role_ids: Vec<Snowflake> },
    RemoveRoles { member_id: Snowflake, role_ids: Vec<Snowflake> },
    DeleteMessage { channel_id: Snowflake, message_id: Snowflake },
    DirectMessage { user_id: Snowflake, content: String },
}

/// History of a channel, or the error reading it yields
#[derive(Debug, Clone)]
pub enum ChannelHistory {
    Messages(Vec<PlatformMessage>),
    Unreadable(PlatformError),
}

pub struct FakePlatform {
    guild_id: Snowflake,
    roles: Mutex<Vec<PlatformRole>>,
    members: Mutex<BTreeMap<Snowflake, PlatformMember>>,
    channels: Mutex<Vec<PlatformChannel>>,
    histories: Mutex<HashMap<Snowflake, ChannelHistory>>,
    messages: Mutex<HashMap<(Snowflake, Snowflake), PlatformMessage>>,
    member_failures: Mutex<HashMap<Snowflake, PlatformError>>,
    deleted_roles: Mutex<HashSet<Snowflake>>,
    members_stream_error: Mutex<Option<PlatformError>>,
    actions: Mutex<Vec<PlatformAction>>,
}

impl FakePlatform {
    pub fn new(guild_id: Snowflake) -> Self {
        Self {
            guild_id,
            roles: Mutex::new(Vec::new()),
            members: Mutex::new(BTreeMap::new()),
            channels: Mutex::new(Vec::new()),
            histories: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
            member_failures: Mutex::new(HashMap::new()),
            deleted_roles: Mutex::new(HashSet::new()),
            members_stream_error: Mutex::new(None),
            actions: Mutex::new(Vec::new()),
        }
    }

    pub fn add_role(&self, role: PlatformRole) {
        self.roles.lock().push(role);
    }

    pub fn add_member(&self, member: PlatformMember) {
        self.members.lock().insert(member.id, member);
    }

    pub fn member(&self, id: Snowflake) -> Option<PlatformMember> {
        self.members.lock().get(&id).cloned()
    }

    pub fn add_channel(&self, channel: PlatformChannel, history: ChannelHistory) {
        self.histories.lock().insert(channel.id, history);
        self.channels.lock().push(channel);
    }

    /// Make a message fetchable and deletable
    pub fn post_message(&self, message: PlatformMessage) {
        self.messages
            .lock()
            .insert((message.channel_id, message.id), message);
    }

    pub fn has_message(&self, channel_id: Snowflake, message_id: Snowflake) -> bool {
        self.messages.lock().contains_key(&(channel_id, message_id))
    }

    /// Make every call targeting `member_id` fail with `error`
    pub fn fail_member(&self, member_id: Snowflake, error: PlatformError) {
        self.member_failures.lock().insert(member_id, error);
    }

    /// Remove a role from the guild; granting or revoking it fails afterwards
    pub fn delete_role(&self, role_id: Snowflake) {
        self.roles.lock().retain(|role| role.id != role_id);
        self.deleted_roles.lock().insert(role_id);
    }

    /// Make the member listing fail after yielding the first member
    pub fn fail_member_listing(&self, error: PlatformError) {
        *self.members_stream_error.lock() = Some(error);
    }

    pub fn actions(&self) -> Vec<PlatformAction> {
        self.actions.lock().clone()
    }

    pub fn direct_messages(&self, user_id: Snowflake) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .filter_map(|action| match action {
                PlatformAction::DirectMessage { user_id: to, content } if *to == user_id => {
                    Some(content.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: PlatformAction) {
        self.actions.lock().push(action);
    }

    fn check_roles(&self, role_ids: &[Snowflake]) -> PlatformResult<()> {
        let deleted = self.deleted_roles.lock();
        if role_ids.iter().any(|role| deleted.contains(role)) {
            return Err(PlatformError::not_found("role"));
        }
        Ok(())
    }

    fn check_member(&self, member_id: Snowflake) -> PlatformResult<()> {
        match self.member_failures.lock().get(&member_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    async fn fetch_roles(&self) -> PlatformResult<Vec<PlatformRole>> {
        Ok(self.roles.lock().clone())
    }

    fn members(&self) -> BoxStream<'_, PlatformResult<PlatformMember>> {
        let members: Vec<PlatformMember> = self.members.lock().values().cloned().collect();
        let mut items: Vec<PlatformResult<PlatformMember>> = members.into_iter().map(Ok).collect();
        if let Some(error) = self.members_stream_error.lock().clone() {
            items.truncate(1);
            items.push(Err(error));
        }
        stream::iter(items).boxed()
    }

    async fn fetch_channels(&self) -> PlatformResult<Vec<PlatformChannel>> {
        Ok(self.channels.lock().clone())
    }

    fn channel_history(&self, channel_id: Snowflake) -> BoxStream<'_, PlatformResult<PlatformMessage>> {
        let items: Vec<PlatformResult<PlatformMessage>> = match self.histories.lock().get(&channel_id) {
            Some(ChannelHistory::Messages(messages)) => messages.iter().cloned().map(Ok).collect(),
            Some(ChannelHistory::Unreadable(error)) => vec![Err(error.clone())],
            None => vec![Err(PlatformError::not_found("channel"))],
        };
        stream::iter(items).boxed()
    }

    async fn fetch_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<PlatformMessage> {
        self.messages
            .lock()
            .get(&(channel_id, message_id))
            .cloned()
            .ok_or(PlatformError::not_found("message"))
    }

    async fn resolve_member(&self, member_id: Snowflake) -> PlatformResult<PlatformMember> {
        self.check_member(member_id)?;
        self.member(member_id)
            .ok_or(PlatformError::not_found("member"))
    }

    async fn kick(&self, member_id: Snowflake, _reason: &str) -> PlatformResult<()> {
        self.check_member(member_id)?;
        self.members.lock().remove(&member_id);
        self.record(PlatformAction::Kick(member_id));
        Ok(())
    }

    async fn ban(&self, member_id: Snowflake, delete_message_days: u8, _reason: &str) -> PlatformResult<()> {
        self.check_member(member_id)?;
        self.members.lock().remove(&member_id);
        self.record(PlatformAction::Ban {
            member_id,
            delete_message_days,
        });
        Ok(())
    }

    async fn add_roles(&self, member_id: Snowflake, role_ids: &[Snowflake], _reason: &str) -> PlatformResult<()> {
        self.check_member(member_id)?;
        self.check_roles(role_ids)?;
        if let Some(member) = self.members.lock().get_mut(&member_id) {
            for role in role_ids {
                if !member.role_ids.contains(role) {
                    member.role_ids.push(*role);
                }
            }
        }
        self.record(PlatformAction::AddRoles {
            member_id,
            role_ids: role_ids.to_vec(),
        });
        Ok(())
    }

    async fn remove_roles(
        &self,
        member_id: Snowflake,
        role_ids: &[Snowflake],
        _reason: &str,
    ) -> PlatformResult<()> {
        self.check_member(member_id)?;
        self.check_roles(role_ids)?;
        if let Some(member) = self.members.lock().get_mut(&member_id) {
            member.role_ids.retain(|role| !role_ids.contains(role));
        }
        self.record(PlatformAction::RemoveRoles {
            member_id,
            role_ids: role_ids.to_vec(),
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake) -> PlatformResult<()> {
        self.record(PlatformAction::DeleteMessage {
            channel_id,
            message_id,
        });
        self.messages
            .lock()
            .remove(&(channel_id, message_id))
            .map(|_| ())
            .ok_or(PlatformError::not_found("message"))
    }

    async fn send_direct_message(&self, user_id: Snowflake, content: &str) -> PlatformResult<()> {
        self.record(PlatformAction::DirectMessage {
            user_id,
            content: content.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Readiness
// ============================================================================

/// Readiness probe with a fixed answer
pub struct StaticProbe(pub bool);

#[async_trait]
impl ReadinessProbe for StaticProbe {
    async fn database(&self) -> bool {
        self.0
    }
}

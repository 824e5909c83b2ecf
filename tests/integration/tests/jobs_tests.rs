//! Periodic job integration tests over the in-memory fakes

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use integration_tests::*;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use butler_core::{
    MemberFilter, NewTask, PlatformClient, PlatformError, RosterRepository, Snowflake,
    TaskRepository, TaskStatus, TaskType,
};
use butler_service::{
    ActivityCounter, ActivityScanJob, AntifraudJob, AntifraudPolicy, GuildSyncJob, Invocation,
    RosterCache, ScheduledJob, Scheduler, SingleFlight, TaskExecutorJob,
};

struct Harness {
    platform: Arc<FakePlatform>,
    tasks: Arc<InMemoryTaskRepository>,
    mirror: Arc<InMemoryRosterRepository>,
    roster: Arc<RosterCache>,
    activity: Arc<ActivityCounter>,
}

impl Harness {
    fn new() -> Self {
        Self {
            platform: Arc::new(FakePlatform::new(GUILD_ID)),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            mirror: Arc::new(InMemoryRosterRepository::new()),
            roster: Arc::new(RosterCache::new()),
            activity: Arc::new(ActivityCounter::new()),
        }
    }

    fn guild_sync(&self) -> GuildSyncJob {
        GuildSyncJob::new(
            self.platform.clone(),
            self.mirror.clone(),
            self.roster.clone(),
            self.activity.clone(),
        )
    }

    fn executor(&self, settings: InMemorySettingsRepository) -> TaskExecutorJob {
        TaskExecutorJob::new(self.platform.clone(), self.tasks.clone(), Arc::new(settings))
    }

    fn antifraud(&self, policy: AntifraudPolicy) -> AntifraudJob {
        AntifraudJob::new(self.roster.clone(), self.tasks.clone(), policy)
    }

    async fn queue(&self, task_type: TaskType, members: &[i64], roles: &[i64]) -> i64 {
        let task = NewTask::new(
            task_type,
            members.iter().copied().map(Snowflake::new).collect(),
            roles.iter().copied().map(Snowflake::new).collect(),
        )
        .unwrap();
        self.tasks.create(&task).await.unwrap().id
    }

    async fn task(&self, id: i64) -> butler_core::Task {
        self.tasks.find_by_id(id).await.unwrap().unwrap()
    }
}

// ============================================================================
// Guild Sync
// ============================================================================

#[tokio::test]
async fn test_guild_sync_replaces_mirror() {
    let h = Harness::new();
    let mods = role(900, "Moderators", 2);
    h.platform.add_role(everyone_role());
    h.platform.add_role(mods.clone());

    let mut alice = member(175_928_847_299_117_063, "alice");
    alice.role_ids.push(mods.id);
    let bob = member(275_928_847_299_117_063, "bob");
    h.platform.add_member(alice.clone());
    h.platform.add_member(bob.clone());

    h.activity.publish(HashMap::from([(alice.id, 25), (bob.id, 0)]));

    h.guild_sync().run().await.unwrap();

    let roles = h.mirror.roles();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "Moderators");

    let members = h.mirror.members();
    assert_eq!(members.len(), 2);
    let row = members.iter().find(|m| m.id == alice.id).unwrap();
    assert_eq!(row.engagement_score, 3);
    assert_eq!(row.messages_count, 25);
    assert_eq!(row.role_ids, vec![mods.id]);
    assert_eq!(row.username, "alice#0001");
    let row = members.iter().find(|m| m.id == bob.id).unwrap();
    assert_eq!(row.engagement_score, 0);
    assert!(row.role_ids.is_empty());

    let snapshot = h.roster.snapshot();
    assert_eq!(snapshot.members.len(), 2);
    assert!(snapshot.fetched_at.is_some());
}

#[tokio::test]
async fn test_guild_sync_second_run_drops_departed_members() {
    let h = Harness::new();
    h.platform.add_role(everyone_role());
    h.platform.add_member(member(1_000, "stays"));
    h.platform.add_member(member(2_000, "leaves"));
    h.guild_sync().run().await.unwrap();
    assert_eq!(h.mirror.members().len(), 2);

    h.platform.kick(Snowflake::new(2_000), "test").await.unwrap();
    h.guild_sync().run().await.unwrap();

    let members = h.mirror.members();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "stays");
}

#[tokio::test]
async fn test_guild_sync_fetch_failure_keeps_previous_state() {
    let h = Harness::new();
    h.platform.add_role(everyone_role());
    h.platform.add_member(member(1_000, "first"));
    h.platform.add_member(member(2_000, "second"));
    h.guild_sync().run().await.unwrap();

    h.platform.add_member(member(3_000, "third"));
    h.platform
        .fail_member_listing(PlatformError::Transport("connection reset".to_string()));

    assert!(h.guild_sync().run().await.is_err());
    assert_eq!(h.mirror.members().len(), 2);
    assert_eq!(h.roster.snapshot().members.len(), 2);
}

#[tokio::test]
async fn test_guild_sync_write_failure_keeps_previous_mirror() {
    let h = Harness::new();
    h.platform.add_role(everyone_role());
    h.platform.add_member(member(1_000, "first"));
    h.guild_sync().run().await.unwrap();

    h.platform.add_member(member(2_000, "second"));
    h.mirror.fail_writes(true);

    let err = h.guild_sync().run().await.unwrap_err();
    assert!(format!("{err:#}").contains("replacing roster mirror"));
    assert_eq!(h.mirror.members().len(), 1);
    assert_eq!(h.mirror.list_roles().await.unwrap().len(), 0);
}

// ============================================================================
// Activity Scan
// ============================================================================

#[tokio::test]
async fn test_activity_scan_counts_and_skips_forbidden() {
    let h = Harness::new();
    h.platform.add_channel(
        text_channel(10, "general"),
        ChannelHistory::Messages(vec![
            history_message(10, 1),
            history_message(10, 1),
            history_message(10, 2),
        ]),
    );
    h.platform.add_channel(
        text_channel(11, "staff"),
        ChannelHistory::Unreadable(PlatformError::Forbidden("Missing Access".to_string())),
    );
    h.platform.add_channel(
        text_channel(12, "random"),
        ChannelHistory::Messages(vec![history_message(12, 2)]),
    );

    let job = ActivityScanJob::new(h.platform.clone(), h.activity.clone());
    job.run().await.unwrap();

    assert_eq!(h.activity.count(Snowflake::new(1)), 2);
    assert_eq!(h.activity.count(Snowflake::new(2)), 2);
    assert_eq!(h.activity.count(Snowflake::new(3)), 0);
}

#[tokio::test]
async fn test_activity_scan_failure_keeps_previous_counts() {
    let h = Harness::new();
    h.activity.publish(HashMap::from([(Snowflake::new(1), 7)]));
    h.platform.add_channel(
        text_channel(10, "general"),
        ChannelHistory::Unreadable(PlatformError::Transport("timeout".to_string())),
    );

    let job = ActivityScanJob::new(h.platform.clone(), h.activity.clone());
    assert!(job.run().await.is_err());
    assert_eq!(h.activity.count(Snowflake::new(1)), 7);
}

// ============================================================================
// Task Executor
// ============================================================================

#[tokio::test]
async fn test_executor_kicks_and_skips_missing_members() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "target"));
    let id = h.queue(TaskType::Kick, &[1_000, 4_040], &[]).await;

    h.executor(InMemorySettingsRepository::new()).run().await.unwrap();

    let task = h.task(id).await;
    assert_eq!(task.status, TaskStatus::Finished);
    assert!(task.error.is_none());
    assert_eq!(h.platform.actions(), vec![PlatformAction::Kick(Snowflake::new(1_000))]);
}

#[tokio::test]
async fn test_executor_failure_does_not_block_siblings() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "protected"));
    h.platform.add_member(member(2_000, "target"));
    h.platform.add_member(member(3_000, "never reached"));
    h.platform
        .fail_member(Snowflake::new(1_000), PlatformError::Forbidden("Missing Permissions".to_string()));

    let failing = h.queue(TaskType::Kick, &[1_000, 3_000], &[]).await;
    let sibling = h.queue(TaskType::Kick, &[2_000], &[]).await;

    h.executor(InMemorySettingsRepository::new()).run().await.unwrap();

    let failed = h.task(failing).await;
    assert_eq!(failed.status, TaskStatus::Failed);
    assert!(failed.error.unwrap().contains("Missing Permissions"));
    assert!(h.platform.member(Snowflake::new(3_000)).is_some());

    assert_eq!(h.task(sibling).await.status, TaskStatus::Finished);
}

#[tokio::test]
async fn test_executor_bans_with_configured_purge() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "spammer"));
    h.queue(TaskType::Ban, &[1_000], &[]).await;

    h.executor(InMemorySettingsRepository::with_delete_days(5))
        .run()
        .await
        .unwrap();

    assert_eq!(
        h.platform.actions(),
        vec![PlatformAction::Ban {
            member_id: Snowflake::new(1_000),
            delete_message_days: 5,
        }]
    );
}

#[tokio::test]
async fn test_executor_assigns_and_removes_roles() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "a"));
    h.platform.add_member(member(2_000, "b"));

    h.queue(TaskType::AssignRole, &[1_000, 2_000], &[900, 901]).await;
    let executor = h.executor(InMemorySettingsRepository::new());
    executor.run().await.unwrap();

    let a = h.platform.member(Snowflake::new(1_000)).unwrap();
    assert!(a.has_role(Snowflake::new(900)) && a.has_role(Snowflake::new(901)));

    h.queue(TaskType::RemoveRole, &[1_000], &[900]).await;
    executor.run().await.unwrap();

    let a = h.platform.member(Snowflake::new(1_000)).unwrap();
    assert!(!a.has_role(Snowflake::new(900)));
    assert!(a.has_role(Snowflake::new(901)));
}

#[tokio::test]
async fn test_executor_skips_claimed_tasks() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "target"));
    let id = h.queue(TaskType::Kick, &[1_000], &[]).await;
    h.tasks.mark_started(id).await.unwrap();

    h.executor(InMemorySettingsRepository::new()).run().await.unwrap();

    assert_eq!(h.task(id).await.status, TaskStatus::Started);
    assert!(h.platform.actions().is_empty());
}

#[tokio::test]
async fn test_executor_fails_role_task_for_deleted_role() {
    let h = Harness::new();
    h.platform.add_role(role(901, "Verified", 1));
    h.platform.add_member(member(1_000, "a"));
    h.platform.delete_role(Snowflake::new(901));

    let id = h.queue(TaskType::AssignRole, &[1_000], &[901]).await;
    h.executor(InMemorySettingsRepository::new()).run().await.unwrap();

    let task = h.task(id).await;
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error.unwrap().contains("role not found"));
    assert!(!h
        .platform
        .member(Snowflake::new(1_000))
        .unwrap()
        .has_role(Snowflake::new(901)));
}

#[tokio::test]
async fn test_executor_keeps_going_when_outcome_write_fails() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "first"));
    h.platform.add_member(member(2_000, "second"));
    let first = h.queue(TaskType::Kick, &[1_000], &[]).await;
    let second = h.queue(TaskType::Kick, &[2_000], &[]).await;
    h.tasks.fail_completion(true);

    h.executor(InMemorySettingsRepository::new()).run().await.unwrap();

    assert_eq!(
        h.platform.actions(),
        vec![
            PlatformAction::Kick(Snowflake::new(1_000)),
            PlatformAction::Kick(Snowflake::new(2_000)),
        ]
    );
    assert_eq!(h.task(first).await.status, TaskStatus::Started);
    assert_eq!(h.task(second).await.status, TaskStatus::Started);
}

// ============================================================================
// Antifraud
// ============================================================================

fn accountant_policy(allowed: &[i64]) -> AntifraudPolicy {
    AntifraudPolicy {
        protected_term: "The_Accountant".to_string(),
        allowed_member_ids: allowed.iter().copied().map(Snowflake::new).collect(),
    }
}

#[tokio::test]
async fn test_antifraud_queues_one_ban_across_cycles() {
    let h = Harness::new();
    h.platform.add_role(everyone_role());
    h.platform.add_member(member(1_000, "The_Accountant"));
    let mut nicked = member(3_000, "innocent");
    nicked.nick = Some("the_accountant official".to_string());
    h.platform.add_member(nicked);
    let mut global = member(2_000, "someone");
    global.global_name = Some("THE_ACCOUNTANT".to_string());
    h.platform.add_member(global);
    h.platform.add_member(member(4_000, "regular"));
    h.guild_sync().run().await.unwrap();

    let job = h.antifraud(accountant_policy(&[1_000]));
    job.run().await.unwrap();
    job.run().await.unwrap();

    let tasks = h.tasks.all();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_type, TaskType::Ban);
    assert_eq!(
        tasks[0].member_ids,
        vec![Snowflake::new(2_000), Snowflake::new(3_000)]
    );
}

#[tokio::test]
async fn test_antifraud_does_not_requeue_after_ban_finished() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "the_accountant_2"));
    h.guild_sync().run().await.unwrap();

    let job = h.antifraud(accountant_policy(&[]));
    job.run().await.unwrap();

    let id = h.tasks.all()[0].id;
    h.tasks.mark_started(id).await.unwrap();
    h.tasks.mark_finished(id).await.unwrap();

    job.run().await.unwrap();
    assert_eq!(h.tasks.all().len(), 1);
}

#[tokio::test]
async fn test_antifraud_disabled_or_clean_roster() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "the_accountant"));
    h.guild_sync().run().await.unwrap();

    h.antifraud(AntifraudPolicy::default()).run().await.unwrap();
    h.antifraud(accountant_policy(&[1_000])).run().await.unwrap();

    assert!(h.tasks.all().is_empty());
}

// ============================================================================
// Scheduler
// ============================================================================

#[tokio::test]
async fn test_scheduler_runs_jobs_after_ready() {
    let h = Harness::new();
    h.platform.add_role(everyone_role());
    h.platform.add_member(member(1_000, "target"));
    let id = h.queue(TaskType::Kick, &[1_000], &[]).await;

    let (ready_tx, ready_rx) = watch::channel(false);
    let cancel = CancellationToken::new();
    let mut scheduler = Scheduler::new(ready_rx, cancel.clone());
    let sync = scheduler.spawn(Arc::new(h.guild_sync()), Duration::from_millis(50));
    let executor = scheduler.spawn(
        Arc::new(h.executor(InMemorySettingsRepository::new())),
        Duration::from_millis(50),
    );
    assert_eq!(scheduler.units().len(), 2);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(sync.stats().attempts(), 0);
    assert_eq!(h.task(id).await.status, TaskStatus::InQueue);

    ready_tx.send_replace(true);
    tokio::time::sleep(Duration::from_millis(200)).await;

    cancel.cancel();
    scheduler.join().await;

    assert!(sync.stats().executions() >= 2);
    assert_eq!(sync.stats().failures(), 0);
    assert!(executor.stats().executions() >= 1);
    assert_eq!(h.task(id).await.status, TaskStatus::Finished);
}

#[tokio::test]
async fn test_single_flight_contains_job_failures() {
    let h = Harness::new();
    h.platform.add_member(member(1_000, "first"));
    h.mirror.fail_writes(true);

    let unit = SingleFlight::new(Arc::new(h.guild_sync()));
    assert_eq!(unit.invoke().await, Invocation::Failed);

    h.mirror.fail_writes(false);
    assert_eq!(unit.invoke().await, Invocation::Succeeded);

    assert_eq!(unit.stats().attempts(), 2);
    assert_eq!(unit.stats().failures(), 1);
    let filter = MemberFilter {
        limit: 10,
        ..Default::default()
    };
    assert_eq!(h.mirror.list_members(&filter).await.unwrap().len(), 1);
}

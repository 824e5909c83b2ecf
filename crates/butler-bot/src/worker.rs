//! Worker bootstrap: wires storage, the platform adapter, the gateway
//! session, the spam detector and the scheduled jobs, then runs until shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use butler_cache::{RedisMessageCache, RedisPool, RedisPoolConfig};
use butler_common::AppConfig;
use butler_core::{
    MessageCache, PlatformClient, RosterRepository, SettingsRepository, TaskRepository,
};
use butler_db::{
    create_pool, run_migrations, PgRosterRepository, PgSettingsRepository, PgTaskRepository,
};
use butler_platform::{DiscordClient, GatewayClient, Intents};
use butler_service::{
    ActivityCounter, ActivityScanJob, AntifraudJob, AntifraudPolicy, GuildSyncJob, RosterCache,
    Scheduler, SpamDetector, SpamPolicy, TaskExecutorJob,
};

use crate::events::pump_events;

/// Gateway events buffered between the session and the detector
const EVENT_BUFFER: usize = 256;

/// Run the worker until Ctrl+C or a fatal gateway error
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let discord = config.require_discord()?.clone();

    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&config.database)
        .await
        .context("connecting to PostgreSQL")?;
    run_migrations(&pool).await.context("applying schema")?;

    let task_repo: Arc<dyn TaskRepository> = Arc::new(PgTaskRepository::new(pool.clone()));
    let roster_repo: Arc<dyn RosterRepository> = Arc::new(PgRosterRepository::new(pool.clone()));
    let settings_repo: Arc<dyn SettingsRepository> = Arc::new(PgSettingsRepository::new(pool));

    info!("Connecting to Redis...");
    let redis = RedisPool::new(RedisPoolConfig::from(&config.redis)).context("creating Redis pool")?;
    let cache: Arc<dyn MessageCache> = Arc::new(RedisMessageCache::new(redis));
    cache.ensure_index().await.context("creating message index")?;

    let platform: Arc<dyn PlatformClient> = Arc::new(DiscordClient::new(&discord)?);

    let cancel = CancellationToken::new();
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (gateway, ready) = GatewayClient::new(&discord, Intents::moderation(), events_tx);
    let mut gateway_task = tokio::spawn(gateway.run(cancel.clone()));

    let detector = match config.antispam.mute_role_id {
        Some(mute_role_id) => Some(Arc::new(SpamDetector::new(
            Arc::clone(&platform),
            Arc::clone(&cache),
            SpamPolicy {
                retention: config.antispam.retention,
                retries_until_mute: config.antispam.retries_until_mute,
                mute_role_id,
                exempt_role_ids: config.antispam.exempt_role_ids.clone(),
            },
        ))),
        None => {
            warn!("ANTISPAM_MUTE_ROLE_ID not set, spam detection disabled");
            None
        }
    };
    let events_task = tokio::spawn(pump_events(events_rx, detector, cancel.clone()));

    let roster = Arc::new(RosterCache::new());
    let activity = Arc::new(ActivityCounter::new());
    let schedule = &config.schedule;

    let mut scheduler = Scheduler::new(ready, cancel.clone());
    scheduler.spawn(
        Arc::new(GuildSyncJob::new(
            Arc::clone(&platform),
            roster_repo,
            Arc::clone(&roster),
            Arc::clone(&activity),
        )),
        schedule.sync_discord,
    );
    scheduler.spawn(
        Arc::new(ActivityScanJob::new(Arc::clone(&platform), activity)),
        schedule.activity_scan,
    );
    scheduler.spawn(
        Arc::new(TaskExecutorJob::new(
            Arc::clone(&platform),
            Arc::clone(&task_repo),
            settings_repo,
        )),
        schedule.tasks_scan,
    );
    scheduler.spawn(
        Arc::new(AntifraudJob::new(
            roster,
            task_repo,
            AntifraudPolicy {
                protected_term: config.antifraud.protected_term.clone(),
                allowed_member_ids: config.antifraud.allowed_member_ids.clone(),
            },
        )),
        schedule.antifraud_scan,
    );

    info!(guild_id = %discord.guild_id, "Worker started");

    let finished = tokio::select! {
        () = shutdown_signal() => None,
        result = &mut gateway_task => Some(result),
    };

    cancel.cancel();
    scheduler.join().await;
    if let Err(e) = events_task.await {
        warn!(error = %e, "Event pump ended abnormally");
    }

    let gateway_result = match finished {
        Some(result) => result,
        None => gateway_task.await,
    };

    match gateway_result {
        Ok(Ok(())) => {
            info!("Worker stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Gateway session ended");
            Err(e.into())
        }
        Err(e) => Err(anyhow::Error::new(e).context("gateway task panicked")),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

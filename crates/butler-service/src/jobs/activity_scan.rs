//! Activity scan: message counts per author across readable channels

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use butler_core::{PlatformClient, Snowflake};

use crate::scheduler::ScheduledJob;
use crate::state::ActivityCounter;

/// Streams every readable channel's full history and publishes the counts
pub struct ActivityScanJob {
    platform: Arc<dyn PlatformClient>,
    activity: Arc<ActivityCounter>,
}

impl ActivityScanJob {
    pub fn new(platform: Arc<dyn PlatformClient>, activity: Arc<ActivityCounter>) -> Self {
        Self { platform, activity }
    }
}

#[async_trait]
impl ScheduledJob for ActivityScanJob {
    fn name(&self) -> &'static str {
        "activity_scan"
    }

    #[instrument(skip(self), fields(job = "activity_scan"))]
    async fn run(&self) -> anyhow::Result<()> {
        let channels = self
            .platform
            .fetch_channels()
            .await
            .context("fetching channels")?;

        let mut counts: HashMap<Snowflake, u64> = HashMap::new();
        let mut scanned = 0usize;
        let mut skipped = 0usize;

        for channel in channels.iter().filter(|c| c.kind.has_history()) {
            let mut history = self.platform.channel_history(channel.id);
            let mut seen = 0u64;

            while let Some(message) = history.next().await {
                match message {
                    Ok(message) => {
                        *counts.entry(message.author_id).or_default() += 1;
                        seen += 1;
                    }
                    Err(e) if e.is_forbidden() || e.is_not_found() => {
                        debug!(channel_id = %channel.id, error = %e, "Channel history not readable, skipping");
                        skipped += 1;
                        break;
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("reading history of channel {}", channel.id));
                    }
                }
            }

            if seen > 0 {
                scanned += 1;
            }
        }

        if skipped > 0 {
            warn!(skipped, "Some channels could not be read");
        }
        info!(channels = scanned, authors = counts.len(), "Activity counts refreshed");

        self.activity.publish(counts);
        Ok(())
    }
}

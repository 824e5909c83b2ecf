//! Interval loops driving single-flight units

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{ScheduledJob, SingleFlight};

/// Run `unit` every `period` until `cancel` fires
///
/// Nothing runs before `ready` turns true. Each tick spawns one invocation;
/// invocations still running at shutdown are awaited.
pub async fn schedule(
    unit: Arc<SingleFlight>,
    period: Duration,
    mut ready: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    let job = unit.name();

    tokio::select! {
        () = cancel.cancelled() => return,
        result = ready.wait_for(|ready| *ready) => {
            if result.is_err() {
                warn!(job, "Ready signal dropped before firing, job not started");
                return;
            }
        }
    }

    info!(job, period_secs = period.as_secs(), "Job scheduled");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let unit = Arc::clone(&unit);
                in_flight.spawn(async move { unit.invoke().await });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    while in_flight.join_next().await.is_some() {}
    info!(job, "Job stopped");
}

/// Owns the loops of every scheduled job
pub struct Scheduler {
    ready: watch::Receiver<bool>,
    cancel: CancellationToken,
    loops: JoinSet<()>,
    units: Vec<Arc<SingleFlight>>,
}

impl Scheduler {
    pub fn new(ready: watch::Receiver<bool>, cancel: CancellationToken) -> Self {
        Self {
            ready,
            cancel,
            loops: JoinSet::new(),
            units: Vec::new(),
        }
    }

    /// Start a loop for `job`; the returned handle exposes its counters
    pub fn spawn(&mut self, job: Arc<dyn ScheduledJob>, period: Duration) -> Arc<SingleFlight> {
        let unit = Arc::new(SingleFlight::new(job));
        self.loops.spawn(schedule(
            Arc::clone(&unit),
            period,
            self.ready.clone(),
            self.cancel.clone(),
        ));
        self.units.push(Arc::clone(&unit));
        unit
    }

    pub fn units(&self) -> &[Arc<SingleFlight>] {
        &self.units
    }

    /// Wait for every loop to exit after cancellation
    pub async fn join(mut self) {
        while let Some(result) = self.loops.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Scheduler loop ended abnormally");
            }
        }
    }
}

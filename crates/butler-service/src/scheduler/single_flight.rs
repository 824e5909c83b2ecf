//! At-most-one in-flight execution per job

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::ScheduledJob;

/// What a single invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Another execution held the guard
    Skipped,
    Succeeded,
    /// The body returned an error or panicked
    Failed,
}

/// Counters kept per job
#[derive(Debug, Default)]
pub struct JobStats {
    attempts: AtomicU64,
    executions: AtomicU64,
    failures: AtomicU64,
}

impl JobStats {
    /// Every invocation, including skipped ones
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Invocations that acquired the guard and ran the body
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    /// Executions that ended in an error or panic
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Wraps a job with a non-blocking guard and failure containment
pub struct SingleFlight {
    job: Arc<dyn ScheduledJob>,
    guard: Mutex<()>,
    stats: JobStats,
}

impl SingleFlight {
    pub fn new(job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            job,
            guard: Mutex::new(()),
            stats: JobStats::default(),
        }
    }

    /// Name of the wrapped job
    pub fn name(&self) -> &'static str {
        self.job.name()
    }

    pub fn stats(&self) -> &JobStats {
        &self.stats
    }

    /// Run the job unless an execution is already in flight
    ///
    /// Errors and panics are logged here and never escape.
    pub async fn invoke(&self) -> Invocation {
        let job = self.job.name();
        self.stats.attempts.fetch_add(1, Ordering::Relaxed);

        // Released on drop, including after a caught panic
        let Ok(_guard) = self.guard.try_lock() else {
            debug!(job, "Previous run still in flight, skipping");
            return Invocation::Skipped;
        };
        self.stats.executions.fetch_add(1, Ordering::Relaxed);

        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.job.run()).catch_unwind().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(())) => {
                debug!(job, elapsed_ms, "Job finished");
                Invocation::Succeeded
            }
            Ok(Err(e)) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(job, elapsed_ms, error = %format!("{e:#}"), "Job failed");
                Invocation::Failed
            }
            Err(panic) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(job, elapsed_ms, panic = panic_message(panic.as_ref()), "Job panicked");
                Invocation::Failed
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

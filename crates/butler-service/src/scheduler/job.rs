//! Unit of periodic work

use async_trait::async_trait;

/// A job body driven by the scheduler
///
/// Bodies stay thin: errors bubble up as `anyhow` and are reported at the
/// scheduler boundary, never retried inside the body.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    /// Stable name used in logs
    fn name(&self) -> &'static str;

    /// Run one cycle to completion
    async fn run(&self) -> anyhow::Result<()>;
}

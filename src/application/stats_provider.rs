// Provider trait for raw usage stats
use crate::domain::stats::StatsEnvelope;
use async_trait::async_trait;

#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Fetch the raw aggregate rows for every metric family in one call
    async fn fetch_stats(&self) -> anyhow::Result<StatsEnvelope>;
}

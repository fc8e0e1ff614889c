// HTTP stats provider implementation
use crate::application::stats_provider::StatsProvider;
use crate::domain::stats::StatsEnvelope;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpStatsProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpStatsProvider {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StatsProvider for HttpStatsProvider {
    async fn fetch_stats(&self) -> Result<StatsEnvelope> {
        tracing::debug!("Fetching stats from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to stats endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Stats request failed with status {}: {}", status, body);
        }

        response
            .json::<StatsEnvelope>()
            .await
            .context("Failed to parse stats response")
    }
}

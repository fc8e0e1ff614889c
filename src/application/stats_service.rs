// Stats service - fetch once, normalize every configured panel
use crate::application::stats_provider::StatsProvider;
use crate::domain::series::normalize;
use crate::domain::stats::{ChartPanel, Dashboard, StatsEnvelope};
use crate::infrastructure::config::PanelConfig;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const DASHBOARD_TITLE: &str = "Usage Stats";

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSkeleton {
    pub id: String,
    pub title: String,
    pub value_label: String,
}

/// Progressive delivery: skeleton first, one message per panel, then completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsMessage {
    Skeleton(Vec<PanelSkeleton>),
    Panel(ChartPanel),
    Complete {
        panels: usize,
        dropped_rows: usize,
        duration_ms: i64,
    },
}

#[derive(Clone)]
pub struct StatsService {
    provider: Arc<dyn StatsProvider>,
    panels: Vec<PanelConfig>,
}

impl StatsService {
    pub fn new(provider: Arc<dyn StatsProvider>, panels: Vec<PanelConfig>) -> Self {
        Self { provider, panels }
    }

    /// Build every panel from a single fetch. A failed fetch still yields all
    /// panels, each with an empty series.
    pub async fn build_dashboard(&self) -> Dashboard {
        let envelope = self.load().await;
        let panels = self
            .panels
            .iter()
            .map(|config| build_panel(config, &envelope))
            .collect();

        let dashboard = Dashboard::new(DASHBOARD_TITLE.to_string(), panels);
        tracing::debug!(
            "Built dashboard with {} panels ({} rows dropped)",
            dashboard.panels.len(),
            dashboard.dropped_rows()
        );
        dashboard
    }

    pub fn stream_dashboard(&self) -> mpsc::Receiver<StatsMessage> {
        let (tx, rx) = mpsc::channel(16);
        let service = self.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let skeleton = service
                .panels
                .iter()
                .map(|p| PanelSkeleton {
                    id: p.id.clone(),
                    title: p.title.clone(),
                    value_label: p.value_label.clone(),
                })
                .collect();
            if tx.send(StatsMessage::Skeleton(skeleton)).await.is_err() {
                return;
            }

            let envelope = service.load().await;
            let mut dropped_rows = 0;
            for config in &service.panels {
                let panel = build_panel(config, &envelope);
                dropped_rows += panel.dropped_rows;
                if tx.send(StatsMessage::Panel(panel)).await.is_err() {
                    tracing::debug!("Stats stream receiver dropped before panel {}", config.id);
                    return;
                }
            }

            let complete = StatsMessage::Complete {
                panels: service.panels.len(),
                dropped_rows,
                duration_ms: start_time.elapsed().as_millis() as i64,
            };
            let _ = tx.send(complete).await;
        });

        rx
    }

    async fn load(&self) -> StatsEnvelope {
        match self.provider.fetch_stats().await {
            Ok(envelope) => {
                if let Some(error) = &envelope.error {
                    tracing::warn!("Stats provider reported an error: {}", error);
                }
                if envelope.data.is_none() {
                    tracing::info!("Stats response carried no data, panels will be empty");
                }
                envelope
            }
            Err(e) => {
                tracing::error!("Error fetching stats: {:#}", e);
                StatsEnvelope::default()
            }
        }
    }
}

fn build_panel(config: &PanelConfig, envelope: &StatsEnvelope) -> ChartPanel {
    let normalized = normalize(envelope.rows(&config.source), config.field);

    if !normalized.dropped.is_empty() {
        tracing::warn!(
            panel = %config.id,
            source = %config.source,
            dropped = normalized.dropped.len(),
            "Dropped malformed stats rows"
        );
        for defect in &normalized.dropped {
            tracing::debug!(panel = %config.id, "{}", defect);
        }
    }

    ChartPanel::new(
        config.id.clone(),
        config.title.clone(),
        config.value_label.clone(),
        normalized.series,
        normalized.dropped.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::default_panels;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedProvider(serde_json::Value);

    #[async_trait]
    impl StatsProvider for FixedProvider {
        async fn fetch_stats(&self) -> anyhow::Result<StatsEnvelope> {
            Ok(serde_json::from_value(self.0.clone())?)
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl StatsProvider for FailingProvider {
        async fn fetch_stats(&self) -> anyhow::Result<StatsEnvelope> {
            anyhow::bail!("upstream unavailable")
        }
    }

    fn service(provider: impl StatsProvider + 'static) -> StatsService {
        StatsService::new(Arc::new(provider), default_panels().unwrap())
    }

    fn sample() -> serde_json::Value {
        json!({
            "data": {
                "weeklyActiveUsers": [
                    {"time_step": "2024-01-08", "user_count_step": "12", "request_count_step": "900"},
                    {"time_step": "2024-01-01", "user_count_step": "5", "request_count_step": "400"}
                ],
                "dailyActiveUsers": [
                    {"time_step": "2024-01-02", "user_count_step": "N/A", "request_count_step": "30"},
                    {"time_step": "2024-01-01", "user_count_step": "2", "request_count_step": "10"}
                ],
                "integratedUsers": [
                    {"time_step": "2024-01-01", "count_step": 40}
                ]
            }
        })
    }

    fn panel<'a>(dashboard: &'a Dashboard, id: &str) -> &'a ChartPanel {
        dashboard.panels.iter().find(|p| p.id == id).unwrap()
    }

    #[tokio::test]
    async fn test_build_dashboard_reuses_rows_per_field() {
        let dashboard = service(FixedProvider(sample())).build_dashboard().await;

        assert_eq!(dashboard.panels.len(), 6);
        let users: Vec<f64> = panel(&dashboard, "weeklyActiveUsers")
            .series
            .iter()
            .map(|p| p.value)
            .collect();
        let requests: Vec<f64> = panel(&dashboard, "requestsWeekly")
            .series
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(users, vec![5.0, 12.0]);
        assert_eq!(requests, vec![400.0, 900.0]);
    }

    #[tokio::test]
    async fn test_bad_rows_only_affect_their_panel() {
        let dashboard = service(FixedProvider(sample())).build_dashboard().await;

        let daily_users = panel(&dashboard, "dailyActiveUsers");
        assert_eq!(daily_users.series.len(), 1);
        assert_eq!(daily_users.dropped_rows, 1);

        let daily_requests = panel(&dashboard, "requestsDaily");
        assert_eq!(daily_requests.series.len(), 2);
        assert_eq!(daily_requests.dropped_rows, 0);

        assert!(panel(&dashboard, "growthOverTime").series.is_empty());
        assert_eq!(dashboard.dropped_rows(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_gives_empty_panels() {
        let dashboard = service(FailingProvider).build_dashboard().await;

        assert_eq!(dashboard.panels.len(), 6);
        assert!(dashboard.panels.iter().all(|p| p.series.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_data_gives_empty_panels() {
        let dashboard = service(FixedProvider(json!({"error": "not ready"})))
            .build_dashboard()
            .await;

        assert!(dashboard.panels.iter().all(|p| p.series.is_empty()));
    }

    #[tokio::test]
    async fn test_stream_dashboard_order() {
        let mut rx = service(FixedProvider(sample())).stream_dashboard();

        let mut messages = Vec::new();
        while let Some(msg) = rx.recv().await {
            messages.push(msg);
        }

        assert_eq!(messages.len(), 8);
        match &messages[0] {
            StatsMessage::Skeleton(skeleton) => {
                assert_eq!(skeleton.len(), 6);
                assert_eq!(skeleton[0].title, "Active Users/week");
            }
            other => panic!("expected skeleton, got {:?}", other),
        }
        assert!(messages[1..7].iter().all(|m| matches!(m, StatsMessage::Panel(_))));
        match &messages[7] {
            StatsMessage::Complete {
                panels,
                dropped_rows,
                ..
            } => {
                assert_eq!(*panels, 6);
                assert_eq!(*dropped_rows, 1);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }
}

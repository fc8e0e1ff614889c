use crate::domain::series::MetricField;
use serde::Deserialize;

/// Panels shown when the config file does not list any.
const DEFAULT_PANELS: &str = r#"
[[panels]]
id = "weeklyActiveUsers"
title = "Active Users/week"
source = "weeklyActiveUsers"
field = "user_count_step"
value_label = "Active Users"

[[panels]]
id = "dailyActiveUsers"
title = "Active Users/day"
source = "dailyActiveUsers"
field = "user_count_step"
value_label = "Active Users"

[[panels]]
id = "integratedUsers"
title = "Total Users"
source = "integratedUsers"
field = "count_step"
value_label = "Total Users"

[[panels]]
id = "growthOverTime"
title = "User Growth"
source = "growthOverTime"
field = "count_step"
value_label = "User Count"

[[panels]]
id = "requestsWeekly"
title = "Requests week over week"
source = "weeklyActiveUsers"
field = "request_count_step"
value_label = "Requests"

[[panels]]
id = "requestsDaily"
title = "Requests day by day"
source = "dailyActiveUsers"
field = "request_count_step"
value_label = "Requests"
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamSettings {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/api/stats".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// One chart: which row array to read and which numeric field to plot.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PanelConfig {
    pub id: String,
    pub title: String,
    pub source: String,
    pub field: MetricField,
    pub value_label: String,
}

#[derive(Debug, Deserialize)]
struct PanelCatalog {
    panels: Vec<PanelConfig>,
}

pub fn default_panels() -> anyhow::Result<Vec<PanelConfig>> {
    let catalog: PanelCatalog = toml::from_str(DEFAULT_PANELS)?;
    Ok(catalog.panels)
}

/// Load `config/stats.*` (optional) with `STATS__SECTION__KEY` env overrides.
pub fn load_stats_config() -> anyhow::Result<StatsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/stats").required(false))
        .add_source(
            config::Environment::with_prefix("STATS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut stats: StatsConfig = settings.try_deserialize()?;
    if stats.panels.is_empty() {
        stats.panels = default_panels()?;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_panels_cover_all_charts() {
        let panels = default_panels().unwrap();
        let ids: Vec<&str> = panels.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                "weeklyActiveUsers",
                "dailyActiveUsers",
                "integratedUsers",
                "growthOverTime",
                "requestsWeekly",
                "requestsDaily",
            ]
        );
        assert_eq!(panels[4].source, "weeklyActiveUsers");
        assert_eq!(panels[4].field, MetricField::RequestCountStep);
    }

    #[test]
    fn test_stats_config_from_toml() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                bind = "127.0.0.1:9000"

                [upstream]
                url = "https://stats.internal/api/stats"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let stats: StatsConfig = settings.try_deserialize().unwrap();

        assert_eq!(stats.server.bind, "127.0.0.1:9000");
        assert_eq!(stats.upstream.timeout_secs, 30);
        assert!(stats.panels.is_empty());
    }
}

// Stats payload and dashboard domain models
use super::series::{MetricSeries, RawAggregateRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upstream response: either `data` with named row arrays, or an `error`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatsEnvelope {
    #[serde(default)]
    pub data: Option<StatsData>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatsEnvelope {
    pub fn rows(&self, source: &str) -> Option<&[RawAggregateRow]> {
        self.data.as_ref().and_then(|d| d.rows(source))
    }
}

/// Row arrays keyed by source name (`weeklyActiveUsers`, `growthOverTime`, ...).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StatsData(pub HashMap<String, Vec<RawAggregateRow>>);

impl StatsData {
    pub fn rows(&self, source: &str) -> Option<&[RawAggregateRow]> {
        self.0.get(source).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanel {
    pub id: String,
    pub title: String,
    pub value_label: String,
    pub series: MetricSeries,
    pub dropped_rows: usize,
}

impl ChartPanel {
    pub fn new(
        id: String,
        title: String,
        value_label: String,
        series: MetricSeries,
        dropped_rows: usize,
    ) -> Self {
        Self {
            id,
            title,
            value_label,
            series,
            dropped_rows,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub panels: Vec<ChartPanel>,
}

impl Dashboard {
    pub fn new(title: String, panels: Vec<ChartPanel>) -> Self {
        Self { title, panels }
    }

    pub fn dropped_rows(&self) -> usize {
        self.panels.iter().map(|p| p.dropped_rows).sum()
    }
}

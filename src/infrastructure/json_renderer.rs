// Mapper from domain panels and stream messages to JSON bodies
use crate::application::chart_renderer::{locale_date_label, ChartRenderer, TimeLabel};
use crate::application::stats_service::{PanelSkeleton, StatsMessage};
use crate::domain::stats::{ChartPanel, Dashboard};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPoint {
    pub time: String,
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPanel {
    pub id: String,
    pub title: String,
    pub value_label: String,
    pub dropped_rows: usize,
    pub points: Vec<JsonPoint>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonChartRenderer;

impl ChartRenderer for JsonChartRenderer {
    type Output = JsonPanel;

    fn render(&self, panel: &ChartPanel, time_label: TimeLabel<'_>) -> JsonPanel {
        let points = panel
            .series
            .iter()
            .map(|p| JsonPoint {
                time: p.time.to_rfc3339(),
                value: p.value,
                label: time_label(&p.time),
            })
            .collect();

        JsonPanel {
            id: panel.id.clone(),
            title: panel.title.clone(),
            value_label: panel.value_label.clone(),
            dropped_rows: panel.dropped_rows,
            points,
        }
    }
}

pub fn dashboard_to_json(dashboard: &Dashboard) -> Value {
    let renderer = JsonChartRenderer;
    let panels: Vec<JsonPanel> = dashboard
        .panels
        .iter()
        .map(|p| renderer.render(p, &locale_date_label))
        .collect();

    json!({
        "title": dashboard.title,
        "droppedRows": dashboard.dropped_rows(),
        "panels": panels,
    })
}

pub fn message_to_json(message: &StatsMessage) -> Value {
    match message {
        StatsMessage::Skeleton(skeleton) => json!({
            "type": "skeleton",
            "panels": skeleton.iter().map(skeleton_to_json).collect::<Vec<_>>(),
        }),
        StatsMessage::Panel(panel) => json!({
            "type": "panel",
            "panel": JsonChartRenderer.render(panel, &locale_date_label),
        }),
        StatsMessage::Complete {
            panels,
            dropped_rows,
            duration_ms,
        } => json!({
            "type": "complete",
            "panels": panels,
            "droppedRows": dropped_rows,
            "durationMs": duration_ms,
        }),
    }
}

fn skeleton_to_json(skeleton: &PanelSkeleton) -> Value {
    json!({
        "id": skeleton.id,
        "title": skeleton.title,
        "valueLabel": skeleton.value_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::Point;
    use chrono::{TimeZone, Utc};

    fn panel() -> ChartPanel {
        ChartPanel::new(
            "requestsDaily".to_string(),
            "Requests day by day".to_string(),
            "Requests".to_string(),
            vec![Point::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 10.0)],
            2,
        )
    }

    #[test]
    fn test_render_panel_with_labels() {
        let rendered =
            serde_json::to_value(JsonChartRenderer.render(&panel(), &locale_date_label)).unwrap();

        assert_eq!(
            rendered,
            json!({
                "id": "requestsDaily",
                "title": "Requests day by day",
                "valueLabel": "Requests",
                "droppedRows": 2,
                "points": [
                    {"time": "2024-01-01T00:00:00+00:00", "value": 10.0, "label": "1/1/2024"}
                ]
            })
        );
    }

    #[test]
    fn test_custom_time_label() {
        let iso = |t: &chrono::DateTime<Utc>| t.format("%Y-%m-%d").to_string();
        let rendered = JsonChartRenderer.render(&panel(), &iso);
        assert_eq!(rendered.points[0].label, "2024-01-01");
    }

    #[test]
    fn test_complete_message() {
        let msg = StatsMessage::Complete {
            panels: 6,
            dropped_rows: 1,
            duration_ms: 12,
        };
        assert_eq!(
            message_to_json(&msg),
            json!({"type": "complete", "panels": 6, "droppedRows": 1, "durationMs": 12})
        );
    }
}

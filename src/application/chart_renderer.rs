// Chart rendering seam - panels out, renderer-specific output back
use crate::domain::stats::ChartPanel;
use chrono::{DateTime, Datelike, Utc};

pub type TimeLabel<'a> = &'a dyn Fn(&DateTime<Utc>) -> String;

pub trait ChartRenderer {
    type Output;

    fn render(&self, panel: &ChartPanel, time_label: TimeLabel<'_>) -> Self::Output;
}

/// `M/D/YYYY`, the en-US short date used on the stats page.
pub fn locale_date_label(time: &DateTime<Utc>) -> String {
    format!("{}/{}/{}", time.month(), time.day(), time.year())
}

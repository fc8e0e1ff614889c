// Series normalization - raw aggregate rows to ordered chart points
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One pre-computed (metric, time bucket) measurement as delivered upstream.
///
/// Numeric fields are kept as raw JSON until coercion because the upstream
/// sends counts as either numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAggregateRow {
    #[serde(default)]
    pub time_step: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_count_step: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_count_step: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_step: Option<Value>,
}

impl RawAggregateRow {
    fn field(&self, field: MetricField) -> Option<&Value> {
        match field {
            MetricField::UserCountStep => self.user_count_step.as_ref(),
            MetricField::RequestCountStep => self.request_count_step.as_ref(),
            MetricField::CountStep => self.count_step.as_ref(),
        }
    }
}

/// Which numeric attribute of a row feeds the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    UserCountStep,
    RequestCountStep,
    CountStep,
}

impl MetricField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::UserCountStep => "user_count_step",
            MetricField::RequestCountStep => "request_count_step",
            MetricField::CountStep => "count_step",
        }
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl Point {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// Points ordered by time, non-decreasing.
pub type MetricSeries = Vec<Point>;

/// Why a row was left out of its series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowDefect {
    #[error("row {row}: unparseable time_step {raw}")]
    InvalidTimestamp { row: usize, raw: String },
    #[error("row {row}: {field} is not numeric ({raw})")]
    NonNumericValue {
        row: usize,
        field: MetricField,
        raw: String,
    },
    #[error("row {row}: {field} is missing")]
    MissingField { row: usize, field: MetricField },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub series: MetricSeries,
    pub dropped: Vec<RowDefect>,
}

/// Turn one metric family's rows into a time-ordered series.
///
/// Rows with a bad timestamp or value are dropped and reported in
/// `Normalized::dropped`; the rest of the series is always produced.
/// `None` and an empty slice both give an empty series.
pub fn normalize(rows: Option<&[RawAggregateRow]>, field: MetricField) -> Normalized {
    let rows = rows.unwrap_or_default();
    let mut series = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();

    for (row, raw) in rows.iter().enumerate() {
        match coerce_row(row, raw, field) {
            Ok(point) => series.push(point),
            Err(defect) => dropped.push(defect),
        }
    }

    // sort_by_key is stable: equal timestamps keep input order
    series.sort_by_key(|p| p.time);

    Normalized { series, dropped }
}

fn coerce_row(row: usize, raw: &RawAggregateRow, field: MetricField) -> Result<Point, RowDefect> {
    let time = parse_time(&raw.time_step).ok_or_else(|| RowDefect::InvalidTimestamp {
        row,
        raw: raw.time_step.to_string(),
    })?;

    let value = raw
        .field(field)
        .ok_or(RowDefect::MissingField { row, field })?;
    let number = coerce_number(value).ok_or_else(|| RowDefect::NonNumericValue {
        row,
        field,
        raw: value.to_string(),
    })?;

    Ok(Point::new(time, number))
}

/// Parse a bucket start: RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DD`,
/// or integer epoch milliseconds. Naive forms are taken as UTC.
pub fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_time_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Numeric coercion following unary plus for strings and booleans: blank
/// strings are 0, `0x`/`0o`/`0b` integers are accepted, booleans are 1/0.
/// Unlike unary plus, `null` is rejected, as is anything non-finite.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                parse_numeric_str(trimmed)?
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    number.is_finite().then_some(number)
}

fn parse_numeric_str(s: &str) -> Option<f64> {
    let radix = match s.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => 16,
        Some("0o") => 8,
        Some("0b") => 2,
        _ => return s.parse::<f64>().ok(),
    };
    let digits = &s[2..];
    if digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

//! Result shaping: raw provider payloads into typed data
//!
//! The mapping is metric-kind-driven, not provider-driven: any adapter that
//! produces the documented payload shapes works with the same shaper, so
//! the resolver never special-cases providers.

use chrono::DateTime;
use chrono::NaiveDate;
use serde_json::Value;

use crate::error::ShapeError;
use crate::model::CatalogEntry;
use crate::model::ChannelStats;
use crate::model::ChannelStatsEntry;
use crate::model::DailyValue;
use crate::model::Metric;
use crate::model::MetricKind;
use crate::model::SeriesData;

/// A shaped provider payload, ready for densification or pass-through.
#[derive(Debug, Clone, PartialEq)]
pub enum Shaped {
    /// Sparse dated rows of a daily metric, date-ascending.
    Rows(Vec<DailyValue>),
    /// A catalog of entities, passed through untouched.
    Catalog(Vec<CatalogEntry>),
    /// Channel statistics snapshots, passed through untouched.
    Channels(Vec<ChannelStatsEntry>),
}

impl From<Shaped> for SeriesData {
    fn from(shaped: Shaped) -> Self {
        match shaped {
            Shaped::Rows(rows) => SeriesData::Daily(rows),
            Shaped::Catalog(entries) => SeriesData::Catalog(entries),
            Shaped::Channels(entries) => SeriesData::Channels(entries),
        }
    }
}

/// Maps a raw payload into typed data according to the metric kind.
pub fn shape(payload: &Value, metric: Metric) -> Result<Shaped, ShapeError> {
    match metric.kind() {
        MetricKind::DailySeries => shape_rows(payload).map(Shaped::Rows),
        MetricKind::Catalog => shape_catalog(payload).map(Shaped::Catalog),
        MetricKind::ChannelStats => shape_channels(payload).map(Shaped::Channels),
    }
}

/// Parses the `rows` array of a daily-series payload.
///
/// Each row is a `[date, value]` pair. A payload with no `rows` key means
/// the provider had no activity to report: an empty series, not an error.
fn shape_rows(payload: &Value) -> Result<Vec<DailyValue>, ShapeError> {
    let Some(rows) = payload.get("rows") else {
        return Ok(Vec::new());
    };
    let rows = rows
        .as_array()
        .ok_or_else(|| ShapeError::parse_with_body("rows is not an array", rows))?;

    rows.iter()
        .map(|row| {
            let pair = row
                .as_array()
                .filter(|pair| pair.len() >= 2)
                .ok_or_else(|| ShapeError::parse_with_body("row is not a [date, value] pair", row))?;
            let date = parse_day(&pair[0])?;
            let value = parse_int(&pair[1])?;
            Ok(DailyValue::new(date, value))
        })
        .collect()
}

/// Parses the `items` array of a catalog payload (videos or playlists).
fn shape_catalog(payload: &Value) -> Result<Vec<CatalogEntry>, ShapeError> {
    items(payload)?
        .iter()
        .map(|item| {
            // Search results nest the id as `id.videoId`; playlists carry a
            // plain string id.
            let id = item
                .get("id")
                .and_then(|id| id.as_str().or_else(|| id.get("videoId")?.as_str()))
                .ok_or_else(|| ShapeError::parse_with_body("item has no id", item))?;
            let snippet = item
                .get("snippet")
                .ok_or_else(|| ShapeError::parse_with_body("item has no snippet", item))?;
            let title = snippet
                .get("title")
                .and_then(Value::as_str)
                .ok_or_else(|| ShapeError::parse_with_body("snippet has no title", snippet))?;

            Ok(CatalogEntry {
                id: id.to_string(),
                title: title.to_string(),
                description: snippet
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                published_at: snippet
                    .get("publishedAt")
                    .and_then(Value::as_str)
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|ts| ts.to_utc()),
                thumbnails: snippet.get("thumbnails").cloned(),
            })
        })
        .collect()
}

/// Parses the `items` array of a channel statistics payload.
fn shape_channels(payload: &Value) -> Result<Vec<ChannelStatsEntry>, ShapeError> {
    items(payload)?
        .iter()
        .map(|item| {
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| ShapeError::parse_with_body("item has no id", item))?;
            let statistics = item
                .get("statistics")
                .ok_or_else(|| ShapeError::parse_with_body("item has no statistics", item))?;

            Ok(ChannelStatsEntry {
                id: id.to_string(),
                stats: ChannelStats {
                    views: stat(statistics, "viewCount")?,
                    comments: stat(statistics, "commentCount")?,
                    subscribers: stat(statistics, "subscriberCount")?,
                    videos: stat(statistics, "videoCount")?,
                },
            })
        })
        .collect()
}

fn items(payload: &Value) -> Result<&Vec<Value>, ShapeError> {
    payload
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| ShapeError::parse_with_body("payload has no items array", payload))
}

/// Statistics counters arrive as JSON strings.
fn stat(statistics: &Value, field: &str) -> Result<u64, ShapeError> {
    let value = statistics
        .get(field)
        .ok_or_else(|| ShapeError::parse(format!("statistics has no {field}")))?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ShapeError::parse_with_body(format!("{field} is not a count"), value)),
        Value::String(s) => s
            .parse()
            .map_err(|_| ShapeError::parse_with_body(format!("{field} is not a count"), value)),
        _ => Err(ShapeError::parse_with_body(
            format!("{field} is not a count"),
            value,
        )),
    }
}

fn parse_day(value: &Value) -> Result<NaiveDate, ShapeError> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| ShapeError::parse_with_body("row date is not YYYY-MM-DD", value))
}

fn parse_int(value: &Value) -> Result<i64, ShapeError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            // Fractional metrics (e.g. averageViewDuration) truncate toward
            // zero, matching how the original pipeline parsed them.
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| ShapeError::parse_with_body("row value is not an integer", value)),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| ShapeError::parse_with_body("row value is not an integer", value)),
        _ => Err(ShapeError::parse_with_body(
            "row value is not an integer",
            value,
        )),
    }
}

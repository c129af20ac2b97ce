//! Metric catalog and metric kinds

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// How a metric's payload is shaped and whether it is coverage-tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A numeric daily time series: densified and range-tracked.
    DailySeries,
    /// A catalog of entities (videos, playlists): fetched whole, never
    /// densified or range-tracked.
    Catalog,
    /// Per-channel statistics snapshot: fetched whole, never range-tracked.
    ChannelStats,
}

/// A metric the cache knows how to fetch, shape, and serve.
///
/// Daily metrics carry one integer value per calendar day and flow through
/// the densifier and coverage store. Catalog metrics and channel statistics
/// are entity lists that bypass coverage tracking entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Views,
    Comments,
    Likes,
    Dislikes,
    Shares,
    AverageViewDuration,
    EstimatedMinutesWatched,
    Videos,
    Playlists,
    // The wire name predates the enum; keep serde aligned with `as_str`.
    #[serde(rename = "info")]
    ChannelInfo,
}

impl Metric {
    /// All metrics, in the order a full warm-up job would fetch them.
    pub const ALL: [Metric; 10] = [
        Metric::Views,
        Metric::Comments,
        Metric::Likes,
        Metric::Dislikes,
        Metric::Shares,
        Metric::AverageViewDuration,
        Metric::EstimatedMinutesWatched,
        Metric::Videos,
        Metric::Playlists,
        Metric::ChannelInfo,
    ];

    /// Returns the kind of this metric.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Videos | Metric::Playlists => MetricKind::Catalog,
            Metric::ChannelInfo => MetricKind::ChannelStats,
            _ => MetricKind::DailySeries,
        }
    }

    /// Returns `true` if this metric is a coverage-tracked daily series.
    pub fn is_daily(&self) -> bool {
        self.kind() == MetricKind::DailySeries
    }

    /// The wire/storage name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Views => "views",
            Metric::Comments => "comments",
            Metric::Likes => "likes",
            Metric::Dislikes => "dislikes",
            Metric::Shares => "shares",
            Metric::AverageViewDuration => "averageViewDuration",
            Metric::EstimatedMinutesWatched => "estimatedMinutesWatched",
            Metric::Videos => "videos",
            Metric::Playlists => "playlists",
            Metric::ChannelInfo => "info",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric name.
#[derive(Debug, thiserror::Error)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

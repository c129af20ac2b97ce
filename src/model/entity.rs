//! Entity-list payloads and the resolve result type

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::DailyValue;

/// One item of a catalog metric (a video or playlist).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provider-side identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Description text, empty when the provider omits it.
    #[serde(default)]
    pub description: String,
    /// Publish timestamp, if the provider reports one.
    pub published_at: Option<DateTime<Utc>>,
    /// Thumbnail descriptor, passed through as the provider sent it.
    pub thumbnails: Option<serde_json::Value>,
}

/// Aggregate statistics for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Total view count.
    pub views: u64,
    /// Total comment count.
    pub comments: u64,
    /// Subscriber count.
    pub subscribers: u64,
    /// Number of uploaded videos.
    pub videos: u64,
}

/// A channel statistics snapshot together with the channel it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatsEntry {
    /// Provider-side channel identifier.
    pub id: String,
    /// The statistics snapshot.
    #[serde(flatten)]
    pub stats: ChannelStats,
}

/// What a resolve returns, depending on the metric kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesData {
    /// A calendar-complete daily series.
    Daily(Vec<DailyValue>),
    /// A catalog of videos or playlists.
    Catalog(Vec<CatalogEntry>),
    /// Channel statistics snapshots.
    Channels(Vec<ChannelStatsEntry>),
}

impl SeriesData {
    /// Returns the daily series, if this is one.
    pub fn as_daily(&self) -> Option<&[DailyValue]> {
        match self {
            SeriesData::Daily(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the catalog entries, if this is a catalog.
    pub fn as_catalog(&self) -> Option<&[CatalogEntry]> {
        match self {
            SeriesData::Catalog(entries) => Some(entries),
            _ => None,
        }
    }
}

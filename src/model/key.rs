//! Series identity key

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::Metric;

/// Identity of one cached series: `(owner, channel, metric)`.
///
/// The key is immutable; the coverage store holds at most one
/// [`CacheRecord`](super::CacheRecord) per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    /// The account that owns the provider credential.
    pub owner_id: Uuid,
    /// The provider-side channel identifier.
    pub channel_id: String,
    /// The metric tracked under this key.
    pub metric: Metric,
}

impl SeriesKey {
    /// Creates a new series key.
    pub fn new(owner_id: Uuid, channel_id: impl Into<String>, metric: Metric) -> Self {
        Self {
            owner_id,
            channel_id: channel_id.into(),
            metric,
        }
    }
}

impl fmt::Display for SeriesKey {
    /// Renders `owner:channel:metric`, the form used as the durable store key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.owner_id, self.channel_id, self.metric)
    }
}

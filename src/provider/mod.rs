//! Provider fetch capability
//!
//! One [`FetchAdapter`] implementation exists per external analytics
//! provider. The adapter owns the wire protocol (HTTP client, endpoints,
//! query encoding, timeouts) and is opaque to the cache, which only relies
//! on the payload shapes documented in [`crate::shape`] and on the
//! [`ProviderError`](crate::error::ProviderError) classification.

use async_trait::async_trait;
use serde_json::Value;

use crate::credentials::Credential;
use crate::error::ProviderError;
use crate::model::DateRange;
use crate::model::Metric;

/// The channel a fetch is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelScope {
    /// Provider-side channel identifier.
    pub channel_id: String,
}

impl ChannelScope {
    /// Creates a new channel scope.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
        }
    }
}

/// Capability interface for fetching raw metric data from a provider.
///
/// Implementations must:
/// - pass `credential` explicitly on every call (no ambient client state)
/// - surface `Unauthorized`, `RateLimited`, `BadRequest`, and `Unavailable`
///   distinctly, mapping timeouts to `Unavailable`
/// - return daily rows date-ascending and within the requested range
///
/// The cache never retries a failed fetch; retry policy, if any, lives
/// inside the adapter or with the caller.
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    /// Fetches the raw payload for one metric over one date range.
    ///
    /// For entity-kind metrics the range is advisory; providers typically
    /// ignore it and return the whole list.
    async fn fetch(
        &self,
        credential: &Credential,
        metric: Metric,
        scope: &ChannelScope,
        range: DateRange,
    ) -> Result<Value, ProviderError>;
}

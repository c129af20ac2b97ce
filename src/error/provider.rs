//! Provider fetch error types

use std::time::Duration;

/// Errors surfaced by a provider fetch adapter.
///
/// The cache core never retries; it classifies and forwards. `RateLimited`
/// and `Unavailable` are transient: no partial write ever happens, so the
/// cache is not corrupted and the next read simply tries again.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The credential was rejected by the provider. Surfaced distinctly so
    /// the caller can prompt re-authorization; never retried automatically.
    #[error("Provider rejected the credential")]
    Unauthorized,

    /// The provider throttled the request.
    #[error("Provider rate limit exceeded")]
    RateLimited {
        /// Provider-suggested wait before retrying, if given.
        retry_after: Option<Duration>,
    },

    /// Malformed metric or channel scope.
    #[error("Provider rejected the request: {message}")]
    BadRequest {
        /// Provider-supplied description of the problem.
        message: String,
    },

    /// Provider outage or timeout.
    #[error("Provider unavailable: {message}")]
    Unavailable {
        /// Description of the outage condition.
        message: String,
    },

    /// Transport-level failure while talking to the provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    /// Returns `true` if a later call may succeed without any caller action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Unavailable { .. } | Self::Network(_)
        )
    }
}

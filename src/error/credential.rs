//! Credential lookup error types

use uuid::Uuid;

/// Errors surfaced by a credential manager.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No credential is stored for the owner. Client-actionable; never
    /// retried by the cache.
    #[error("No stored credential for owner {owner_id}")]
    Missing {
        /// The owner whose credential is absent.
        owner_id: Uuid,
    },

    /// The credential backend failed.
    #[error("Credential lookup failed: {message}")]
    Lookup {
        /// Description of the underlying failure.
        message: String,
    },
}

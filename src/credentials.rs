//! Credential lookup seam
//!
//! The cache never issues or refreshes provider tokens; it only looks up
//! the stored credential for an owner and passes it explicitly into each
//! fetch. Token issuance, OAuth scopes, and refresh are external concerns.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CredentialError;

/// An opaque provider credential (typically a refresh or access token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// The secret handed to the provider adapter.
    pub secret: String,
}

impl Credential {
    /// Creates a new credential.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

/// Trait for looking up the stored provider credential of an owner.
///
/// Implementations typically front a token table or secret store. The cache
/// calls this once per resolve, before any provider call, and surfaces
/// [`CredentialError::Missing`] as a client-actionable error.
#[async_trait]
pub trait CredentialManager: Send + Sync {
    /// Returns the credential stored for `owner_id`.
    async fn credential_for(&self, owner_id: Uuid) -> Result<Credential, CredentialError>;
}

/// A credential manager backed by a fixed in-memory map.
///
/// Useful for tests and single-tenant deployments where credentials are
/// known up front.
///
/// # Example
///
/// ```
/// use uuid::Uuid;
/// use seriescache::credentials::{Credential, StaticCredentialManager};
///
/// let owner = Uuid::new_v4();
/// let manager = StaticCredentialManager::new()
///     .with_credential(owner, Credential::new("refresh-token"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialManager {
    credentials: HashMap<Uuid, Credential>,
}

impl StaticCredentialManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a credential for an owner.
    pub fn with_credential(mut self, owner_id: Uuid, credential: Credential) -> Self {
        self.credentials.insert(owner_id, credential);
        self
    }
}

#[async_trait]
impl CredentialManager for StaticCredentialManager {
    async fn credential_for(&self, owner_id: Uuid) -> Result<Credential, CredentialError> {
        self.credentials
            .get(&owner_id)
            .cloned()
            .ok_or(CredentialError::Missing { owner_id })
    }
}

//! Error types

mod credential;
mod provider;
mod shape;
mod store;

pub use credential::*;
pub use provider::*;
pub use shape::*;
pub use store::*;

use crate::model::InvalidRecord;

/// Umbrella error for cache operations.
///
/// The resolver classifies every failure into one of these families and
/// forwards it unchanged; nothing is swallowed and nothing is retried
/// inside the core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credential lookup failed before any provider call.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The provider fetch failed; no store write happened.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The raw payload could not be shaped for the metric kind.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// The coverage store failed; freshly fetched data was discarded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Fetched rows did not assemble into a calendar-complete record.
    #[error(transparent)]
    Record(#[from] InvalidRecord),
}

//! Coverage store error types

/// Errors surfaced by a coverage store.
///
/// `AlreadyExists` and `InvalidExtension` indicate a resolver bug rather
/// than a user-facing condition; correct resolver logic never triggers them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `create` was called for a key that already has a record.
    #[error("Record already exists for {key}")]
    AlreadyExists {
        /// Rendered series key.
        key: String,
    },

    /// `extend` would introduce a gap or overlap the stored range.
    #[error("Invalid extension for {key}: {message}")]
    InvalidExtension {
        /// Rendered series key.
        key: String,
        /// What the extension violated.
        message: String,
    },

    /// The persistence layer failed. Fetched data is discarded and the next
    /// read refetches.
    #[error("Storage failure: {message}")]
    Storage {
        /// Description of the underlying failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a storage failure from any backend error.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

impl From<async_sqlite::Error> for StoreError {
    fn from(err: async_sqlite::Error) -> Self {
        Self::storage(err)
    }
}

//! Coverage store: persistence for cache records
//!
//! One [`CacheRecord`] is stored per [`SeriesKey`]. Every operation is
//! atomic with respect to a single key: a record is either absent or fully
//! valid, and `replace` never exposes an intermediate absent state to
//! concurrent readers. There are no cross-key transactions.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::CacheRecord;
use crate::model::DailyValue;
use crate::model::SeriesKey;

/// Trait for coverage record persistence.
#[async_trait]
pub trait CoverageStore: Send + Sync {
    /// Returns the record for `key`, or `None` when nothing is stored.
    async fn get(&self, key: &SeriesKey) -> Result<Option<CacheRecord>, StoreError>;

    /// Stores a record for a key that has none.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when a record is present.
    async fn create(&self, record: CacheRecord) -> Result<(), StoreError>;

    /// Atomically swaps the full record for its key.
    ///
    /// Concurrent readers of the key observe either the old record or the
    /// new one, never an absent record. Storing over an absent key is
    /// allowed and behaves like `create`.
    async fn replace(&self, record: CacheRecord) -> Result<(), StoreError>;

    /// Appends densified trailing days to an existing record.
    ///
    /// `appended` must begin the day after the stored end, be gap-free, and
    /// finish at `new_end`; `new_last_date` must not pass `new_end`.
    /// Violations, including an absent record, fail with
    /// [`StoreError::InvalidExtension`] and leave the record untouched.
    async fn extend(
        &self,
        key: &SeriesKey,
        appended: Vec<DailyValue>,
        new_end: NaiveDate,
        new_last_date: NaiveDate,
    ) -> Result<(), StoreError>;

    /// Removes the record for `key`, if any.
    ///
    /// Maintenance only: callers that need swap semantics use `replace`,
    /// never remove-then-create.
    async fn remove(&self, key: &SeriesKey) -> Result<(), StoreError>;
}

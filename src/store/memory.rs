//! In-memory coverage store backed by DashMap

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::CoverageStore;
use crate::error::StoreError;
use crate::model::CacheRecord;
use crate::model::DailyValue;
use crate::model::SeriesKey;

/// An in-memory coverage store backed by a concurrent hash map.
///
/// This is the default store. Each operation touches a single map entry
/// under its shard lock, so operations are atomic per key while distinct
/// keys proceed in parallel. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCoverageStore {
    records: DashMap<SeriesKey, CacheRecord>,
}

impl InMemoryCoverageStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CoverageStore for InMemoryCoverageStore {
    async fn get(&self, key: &SeriesKey) -> Result<Option<CacheRecord>, StoreError> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn create(&self, record: CacheRecord) -> Result<(), StoreError> {
        match self.records.entry(record.key.clone()) {
            Entry::Occupied(occupied) => Err(StoreError::AlreadyExists {
                key: occupied.key().to_string(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                Ok(())
            }
        }
    }

    async fn replace(&self, record: CacheRecord) -> Result<(), StoreError> {
        self.records.insert(record.key.clone(), record);
        Ok(())
    }

    async fn extend(
        &self,
        key: &SeriesKey,
        appended: Vec<DailyValue>,
        new_end: NaiveDate,
        new_last_date: NaiveDate,
    ) -> Result<(), StoreError> {
        let Some(mut entry) = self.records.get_mut(key) else {
            return Err(StoreError::InvalidExtension {
                key: key.to_string(),
                message: "no record to extend".to_string(),
            });
        };
        let record = entry.value_mut();
        if !record.extension_is_valid(&appended, new_end, new_last_date) {
            return Err(StoreError::InvalidExtension {
                key: key.to_string(),
                message: format!(
                    "appended rows do not contiguously extend {} to {new_end}",
                    record.range.end()
                ),
            });
        }
        record.apply_extension(appended, new_end, new_last_date);
        Ok(())
    }

    async fn remove(&self, key: &SeriesKey) -> Result<(), StoreError> {
        self.records.remove(key);
        Ok(())
    }
}

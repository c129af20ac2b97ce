//! SQLite-backed durable coverage store

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::CoverageStore;
use crate::error::StoreError;
use crate::model::CacheRecord;
use crate::model::DailyValue;
use crate::model::DateRange;
use crate::model::SeriesKey;

/// A durable coverage store backed by SQLite.
///
/// Records persist across process restarts. Uses WAL journal mode for
/// better concurrent read performance. All statements run on the client's
/// single connection, so each operation is atomic per key; `extend`
/// additionally guards against lost updates with a conditional write on
/// the stored end date.
///
/// # Example
///
/// ```ignore
/// use seriescache::store::SqliteCoverageStore;
///
/// // File-based store
/// let store = SqliteCoverageStore::open("coverage.db").await?;
///
/// // In-memory store (for testing)
/// let store = SqliteCoverageStore::open_in_memory().await?;
/// ```
pub struct SqliteCoverageStore {
    client: Client,
}

impl SqliteCoverageStore {
    /// Opens a store at the specified path.
    ///
    /// Creates the database file and coverage table if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens an in-memory store.
    ///
    /// Useful for testing. Data is lost when the store is dropped.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Initializes the coverage table schema.
    async fn init_schema(client: &Client) -> Result<(), StoreError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS coverage (
                        key TEXT PRIMARY KEY,
                        start_date TEXT NOT NULL,
                        end_date TEXT NOT NULL,
                        last_date TEXT NOT NULL,
                        series TEXT NOT NULL
                    )",
                    [],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    fn decode(
        key: &SeriesKey,
        start: String,
        end: String,
        last: String,
        series: String,
    ) -> Result<CacheRecord, StoreError> {
        let start: NaiveDate = start
            .parse()
            .map_err(|_| StoreError::storage(format!("bad start_date for {key}")))?;
        let end: NaiveDate = end
            .parse()
            .map_err(|_| StoreError::storage(format!("bad end_date for {key}")))?;
        let last: NaiveDate = last
            .parse()
            .map_err(|_| StoreError::storage(format!("bad last_date for {key}")))?;
        let range = DateRange::new(start, end)
            .ok_or_else(|| StoreError::storage(format!("inverted range for {key}")))?;
        let values: Vec<DailyValue> =
            serde_json::from_str(&series).map_err(StoreError::storage)?;

        CacheRecord::new(key.clone(), range, last, values)
            .map_err(|err| StoreError::storage(format!("corrupt record for {key}: {err}")))
    }

    fn encode(values: &[DailyValue]) -> Result<String, StoreError> {
        serde_json::to_string(values).map_err(StoreError::storage)
    }
}

#[async_trait]
impl CoverageStore for SqliteCoverageStore {
    async fn get(&self, key: &SeriesKey) -> Result<Option<CacheRecord>, StoreError> {
        let key_text = key.to_string();

        let row = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    "SELECT start_date, end_date, last_date, series FROM coverage WHERE key = ?",
                    [key_text],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .map(Some)
                .or_else(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })
            })
            .await?;

        match row {
            Some((start, end, last, series)) => {
                Self::decode(key, start, end, last, series).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn create(&self, record: CacheRecord) -> Result<(), StoreError> {
        let key_text = record.key.to_string();
        let series = Self::encode(&record.values)?;
        let start = record.range.start().to_string();
        let end = record.range.end().to_string();
        let last = record.last_date.to_string();

        let inserted = {
            let key_text = key_text.clone();
            self.client
                .conn(move |conn| {
                    conn.execute(
                        "INSERT OR IGNORE INTO coverage
                         (key, start_date, end_date, last_date, series)
                         VALUES (?, ?, ?, ?, ?)",
                        rusqlite::params![key_text, start, end, last, series],
                    )
                })
                .await?
        };

        if inserted == 0 {
            return Err(StoreError::AlreadyExists { key: key_text });
        }
        Ok(())
    }

    async fn replace(&self, record: CacheRecord) -> Result<(), StoreError> {
        let key_text = record.key.to_string();
        let series = Self::encode(&record.values)?;
        let start = record.range.start().to_string();
        let end = record.range.end().to_string();
        let last = record.last_date.to_string();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO coverage
                     (key, start_date, end_date, last_date, series)
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![key_text, start, end, last, series],
                )
            })
            .await?;
        Ok(())
    }

    async fn extend(
        &self,
        key: &SeriesKey,
        appended: Vec<DailyValue>,
        new_end: NaiveDate,
        new_last_date: NaiveDate,
    ) -> Result<(), StoreError> {
        let Some(record) = self.get(key).await? else {
            return Err(StoreError::InvalidExtension {
                key: key.to_string(),
                message: "no record to extend".to_string(),
            });
        };
        if !record.extension_is_valid(&appended, new_end, new_last_date) {
            return Err(StoreError::InvalidExtension {
                key: key.to_string(),
                message: format!(
                    "appended rows do not contiguously extend {} to {new_end}",
                    record.range.end()
                ),
            });
        }

        let old_end = record.range.end().to_string();
        let mut extended = record;
        extended.apply_extension(appended, new_end, new_last_date);

        let key_text = key.to_string();
        let series = Self::encode(&extended.values)?;
        let end = new_end.to_string();
        let last = new_last_date.to_string();

        // Conditional write: if another writer advanced the record since the
        // read above, zero rows match and the extension is rejected instead
        // of clobbering it.
        let updated = {
            let key_text = key_text.clone();
            self.client
                .conn(move |conn| {
                    conn.execute(
                        "UPDATE coverage
                         SET end_date = ?, last_date = ?, series = ?
                         WHERE key = ? AND end_date = ?",
                        rusqlite::params![end, last, series, key_text, old_end],
                    )
                })
                .await?
        };

        if updated == 0 {
            return Err(StoreError::InvalidExtension {
                key: key_text,
                message: "record changed concurrently".to_string(),
            });
        }
        Ok(())
    }

    async fn remove(&self, key: &SeriesKey) -> Result<(), StoreError> {
        let key_text = key.to_string();
        self.client
            .conn(move |conn| conn.execute("DELETE FROM coverage WHERE key = ?", [key_text]))
            .await?;
        Ok(())
    }
}

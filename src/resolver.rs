//! Coverage resolver: the cache's decision engine
//!
//! A resolve inspects the stored coverage for one series, decides the
//! minimal provider call needed to bring it up to the trailing window
//! (none, the full window, or just the missing tail), performs at most one
//! fetch, writes back through the coverage store, and returns the densified
//! window. Entity-list metrics bypass coverage tracking and are refetched
//! whole on every call.

use std::sync::Arc;

use chrono::Days;
use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::warn;

use crate::config::CacheConfig;
use crate::credentials::Credential;
use crate::credentials::CredentialManager;
use crate::densify::densify;
use crate::error::Error;
use crate::error::ShapeError;
use crate::model::CacheRecord;
use crate::model::DailyValue;
use crate::model::DateRange;
use crate::model::SeriesData;
use crate::model::SeriesKey;
use crate::model::next_day;
use crate::provider::ChannelScope;
use crate::provider::FetchAdapter;
use crate::response::CoverageAction;
use crate::response::Resolved;
use crate::shape::Shaped;
use crate::shape::shape;
use crate::store::CoverageStore;

/// The decision engine behind [`SeriesCache`](crate::SeriesCache).
///
/// Holds no durable state of its own; coverage lives in the store, and the
/// resolver only carries the in-flight decision for one call. Resolves for
/// the same key are serialized through a per-key async mutex so that
/// create/replace/extend sequences never interleave; distinct keys proceed
/// fully in parallel.
pub struct CoverageResolver {
    adapter: Arc<dyn FetchAdapter>,
    credentials: Arc<dyn CredentialManager>,
    store: Arc<dyn CoverageStore>,
    config: CacheConfig,
    /// One lock per series ever resolved. Entries are never evicted;
    /// cardinality is bounded by the set of real `(owner, channel, metric)`
    /// triples, the same bound as the store itself.
    locks: DashMap<SeriesKey, Arc<Mutex<()>>>,
}

impl CoverageResolver {
    /// Creates a new resolver.
    pub fn new(
        adapter: Arc<dyn FetchAdapter>,
        credentials: Arc<dyn CredentialManager>,
        store: Arc<dyn CoverageStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            adapter,
            credentials,
            store,
            config,
            locks: DashMap::new(),
        }
    }

    /// The trailing window that must be covered as of `today`:
    /// `[today - min_history_days, today - 1]`, ending yesterday and exactly
    /// `min_history_days` days wide.
    pub fn desired_window(&self, today: NaiveDate) -> DateRange {
        desired_window(self.config.min_history_days, today)
    }

    /// Resolves one series against the trailing window ending the day
    /// before `today`.
    ///
    /// Performs at most one provider fetch and at most one store mutation.
    /// A provider failure aborts with no store write; a store failure after
    /// a successful fetch discards the fetched data, so the next resolve
    /// refetches.
    pub async fn resolve(
        &self,
        key: &SeriesKey,
        today: NaiveDate,
    ) -> Result<Resolved<SeriesData>, Error> {
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let credential = self.credentials.credential_for(key.owner_id).await?;
        let scope = ChannelScope::new(&key.channel_id);
        let desired = self.desired_window(today);

        if !key.metric.is_daily() {
            return self.refetch_entities(&credential, key, &scope, desired).await;
        }

        let existing = self.store.get(key).await?;

        match existing {
            None => {
                debug!(key = %key, window = ?desired, "no coverage, creating record");
                self.create_record(&credential, key, &scope, desired).await
            }
            Some(existing) if desired.start() < existing.range.start() => {
                debug!(
                    key = %key,
                    stored_start = %existing.range.start(),
                    desired_start = %desired.start(),
                    "window shifted earlier, replacing record"
                );
                self.replace_record(&credential, key, &scope, desired).await
            }
            Some(existing) if existing.range.end() < desired.end() => {
                self.extend_record(&credential, key, &scope, existing, desired)
                    .await
            }
            Some(existing) => {
                debug!(key = %key, window = ?desired, "coverage hit");
                Ok(Resolved::new(
                    SeriesData::Daily(existing.slice(&desired)),
                    CoverageAction::Hit,
                ))
            }
        }
    }

    /// Entity-list metrics: whole list, every call, no coverage tracking.
    async fn refetch_entities(
        &self,
        credential: &Credential,
        key: &SeriesKey,
        scope: &ChannelScope,
        range: DateRange,
    ) -> Result<Resolved<SeriesData>, Error> {
        debug!(key = %key, "entity metric, refetching whole list");
        let payload = self
            .adapter
            .fetch(credential, key.metric, scope, range)
            .await?;
        let shaped = shape(&payload, key.metric)?;
        Ok(Resolved::new(shaped.into(), CoverageAction::Refetched))
    }

    async fn create_record(
        &self,
        credential: &Credential,
        key: &SeriesKey,
        scope: &ChannelScope,
        desired: DateRange,
    ) -> Result<Resolved<SeriesData>, Error> {
        let rows = self.fetch_rows(credential, key, scope, desired).await?;
        let values = densify(&rows, desired);
        let last_date = last_row_date(&rows, desired.start());
        let record = CacheRecord::new(key.clone(), desired, last_date, values.clone())?;

        if let Err(err) = self.store.create(record).await {
            warn!(key = %key, error = %err, "store create failed, discarding fetched data");
            return Err(err.into());
        }
        Ok(Resolved::new(
            SeriesData::Daily(values),
            CoverageAction::Created,
        ))
    }

    /// Full re-window: the whole desired range is refetched and the old
    /// record atomically superseded. Fetching only the missing prefix and
    /// merging would be cheaper; the full refetch mirrors the established
    /// behavior for this branch.
    async fn replace_record(
        &self,
        credential: &Credential,
        key: &SeriesKey,
        scope: &ChannelScope,
        desired: DateRange,
    ) -> Result<Resolved<SeriesData>, Error> {
        let rows = self.fetch_rows(credential, key, scope, desired).await?;
        let values = densify(&rows, desired);
        let last_date = last_row_date(&rows, desired.start());
        let record = CacheRecord::new(key.clone(), desired, last_date, values.clone())?;

        if let Err(err) = self.store.replace(record).await {
            warn!(key = %key, error = %err, "store replace failed, discarding fetched data");
            return Err(err.into());
        }
        Ok(Resolved::new(
            SeriesData::Daily(values),
            CoverageAction::Replaced,
        ))
    }

    /// Forward extension: the only partial-fetch path. The provider is
    /// asked for exactly `[last_date + 1, desired.end]`, never the full
    /// window, and the stored prefix is left untouched.
    async fn extend_record(
        &self,
        credential: &Credential,
        key: &SeriesKey,
        scope: &ChannelScope,
        existing: CacheRecord,
        desired: DateRange,
    ) -> Result<Resolved<SeriesData>, Error> {
        // last_date <= end < desired.end, so the fetch range is never empty.
        let fetch_range = DateRange::new(next_day(existing.last_date), desired.end())
            .unwrap_or_else(|| DateRange::single(desired.end()));
        debug!(
            key = %key,
            stored_end = %existing.range.end(),
            fetch = ?fetch_range,
            "extending coverage forward"
        );

        let rows = self.fetch_rows(credential, key, scope, fetch_range).await?;

        // Rows dated at or before the stored end exist when last_date lags
        // the end; those days are already stored and are not rewritten.
        let tail = DateRange::new(next_day(existing.range.end()), desired.end())
            .unwrap_or_else(|| DateRange::single(desired.end()));
        let tail_rows: Vec<DailyValue> = rows
            .iter()
            .filter(|row| row.date > existing.range.end())
            .copied()
            .collect();
        let appended = densify(&tail_rows, tail);
        let new_last_date = last_row_date(&rows, existing.last_date);

        if let Err(err) = self
            .store
            .extend(key, appended.clone(), desired.end(), new_last_date)
            .await
        {
            warn!(key = %key, error = %err, "store extend failed, discarding fetched data");
            return Err(err.into());
        }

        let mut extended = existing;
        extended.apply_extension(appended, desired.end(), new_last_date);
        Ok(Resolved::new(
            SeriesData::Daily(extended.slice(&desired)),
            CoverageAction::Extended {
                fetched: fetch_range,
            },
        ))
    }

    async fn fetch_rows(
        &self,
        credential: &Credential,
        key: &SeriesKey,
        scope: &ChannelScope,
        range: DateRange,
    ) -> Result<Vec<DailyValue>, Error> {
        let payload = self
            .adapter
            .fetch(credential, key.metric, scope, range)
            .await?;
        match shape(&payload, key.metric)? {
            Shaped::Rows(rows) => Ok(rows),
            _ => Err(ShapeError::parse("daily metric shaped into an entity list").into()),
        }
    }
}

/// Computes the trailing window for a given day.
fn desired_window(min_history_days: u32, today: NaiveDate) -> DateRange {
    let end = today
        .checked_sub_days(Days::new(1))
        .unwrap_or(NaiveDate::MIN);
    let start = today
        .checked_sub_days(Days::new(u64::from(min_history_days.max(1))))
        .unwrap_or(NaiveDate::MIN);
    DateRange::new(start, end).unwrap_or_else(|| DateRange::single(end))
}

/// The resume point after a fetch: the last row's date, or `fallback` when
/// the provider returned nothing (a fresh record resumes from its window
/// start; an extension keeps its previous resume point).
fn last_row_date(rows: &[DailyValue], fallback: NaiveDate) -> NaiveDate {
    match rows.last() {
        Some(row) => row.date,
        None => fallback,
    }
}

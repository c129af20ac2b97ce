//! Main SeriesCache facade

use std::sync::Arc;

use chrono::NaiveDate;
use chrono::Utc;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::credentials::CredentialManager;
use crate::error::Error;
use crate::model::Metric;
use crate::model::SeriesData;
use crate::model::SeriesKey;
use crate::provider::FetchAdapter;
use crate::resolver::CoverageResolver;
use crate::response::Resolved;
use crate::store::CoverageStore;
use crate::store::InMemoryCoverageStore;

/// The main entry point for serving cached metric series.
///
/// This facade is cheap to clone (uses `Arc` internally) and can be shared
/// across threads safely. Every read goes through the coverage resolver,
/// which fetches from the provider only when the stored trailing window has
/// fallen behind.
///
/// # Example
///
/// ```ignore
/// use seriescache::{SeriesCache, Metric};
/// use seriescache::credentials::StaticCredentialManager;
///
/// let cache = SeriesCache::builder()
///     .adapter(my_provider_adapter)
///     .credentials(StaticCredentialManager::new())
///     .build();
///
/// let series = cache
///     .get_metric_series(owner_id, "UC123", Metric::Views)
///     .await?;
/// ```
#[derive(Clone)]
pub struct SeriesCache {
    inner: Arc<CoverageResolver>,
}

impl SeriesCache {
    /// Creates a new builder for constructing a cache.
    pub fn builder() -> SeriesCacheBuilder<Missing, Missing> {
        SeriesCacheBuilder::new()
    }

    /// Resolves one metric series against the trailing window ending
    /// yesterday (UTC).
    pub async fn get_metric_series(
        &self,
        owner_id: Uuid,
        channel_id: impl Into<String>,
        metric: Metric,
    ) -> Result<Resolved<SeriesData>, Error> {
        self.get_metric_series_at(owner_id, channel_id, metric, Utc::now().date_naive())
            .await
    }

    /// Like [`get_metric_series`](Self::get_metric_series) with an explicit
    /// "today", for deterministic tests and replay.
    pub async fn get_metric_series_at(
        &self,
        owner_id: Uuid,
        channel_id: impl Into<String>,
        metric: Metric,
        today: NaiveDate,
    ) -> Result<Resolved<SeriesData>, Error> {
        let key = SeriesKey::new(owner_id, channel_id, metric);
        self.inner.resolve(&key, today).await
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`SeriesCache`].
///
/// Uses the typestate pattern to ensure required fields are set at compile
/// time.
///
/// # Required Fields
///
/// - `adapter` - a [`FetchAdapter`] for the provider
/// - `credentials` - a [`CredentialManager`] for owner tokens
///
/// # Example
///
/// ```ignore
/// let cache = SeriesCache::builder()
///     .adapter(adapter)
///     .credentials(credentials)
///     .store(SqliteCoverageStore::open("coverage.db").await?)
///     .config(CacheConfig::default().with_min_history_days(30))
///     .build();
/// ```
pub struct SeriesCacheBuilder<Adapter, Credentials> {
    adapter: Adapter,
    credentials: Credentials,
    store: Option<Arc<dyn CoverageStore>>,
    config: CacheConfig,
}

impl SeriesCacheBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            adapter: Missing,
            credentials: Missing,
            store: None,
            config: CacheConfig::default(),
        }
    }
}

impl Default for SeriesCacheBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SeriesCacheBuilder<Missing, C> {
    /// Sets the provider fetch adapter.
    pub fn adapter<A: FetchAdapter + 'static>(
        self,
        adapter: A,
    ) -> SeriesCacheBuilder<Set<Arc<dyn FetchAdapter>>, C> {
        SeriesCacheBuilder {
            adapter: Set(Arc::new(adapter) as Arc<dyn FetchAdapter>),
            credentials: self.credentials,
            store: self.store,
            config: self.config,
        }
    }
}

impl<A> SeriesCacheBuilder<A, Missing> {
    /// Sets the credential manager.
    pub fn credentials<C: CredentialManager + 'static>(
        self,
        credentials: C,
    ) -> SeriesCacheBuilder<A, Set<Arc<dyn CredentialManager>>> {
        SeriesCacheBuilder {
            adapter: self.adapter,
            credentials: Set(Arc::new(credentials) as Arc<dyn CredentialManager>),
            store: self.store,
            config: self.config,
        }
    }
}

impl<A, C> SeriesCacheBuilder<A, C> {
    /// Sets the coverage store.
    ///
    /// Defaults to an [`InMemoryCoverageStore`].
    pub fn store<S: CoverageStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store) as Arc<dyn CoverageStore>);
        self
    }

    /// Sets the cache configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }
}

impl SeriesCacheBuilder<Set<Arc<dyn FetchAdapter>>, Set<Arc<dyn CredentialManager>>> {
    /// Builds the [`SeriesCache`].
    ///
    /// This method is only available when both `adapter` and `credentials`
    /// have been set.
    pub fn build(self) -> SeriesCache {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryCoverageStore::new()));

        SeriesCache {
            inner: Arc::new(CoverageResolver::new(
                self.adapter.0,
                self.credentials.0,
                store,
                self.config,
            )),
        }
    }
}

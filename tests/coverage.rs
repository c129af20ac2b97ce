//! End-to-end coverage resolution scenarios over the public API.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use serde_json::json;
use uuid::Uuid;

use seriescache::CoverageAction;
use seriescache::Error;
use seriescache::Metric;
use seriescache::SeriesCache;
use seriescache::SeriesData;
use seriescache::config::CacheConfig;
use seriescache::credentials::Credential;
use seriescache::credentials::StaticCredentialManager;
use seriescache::error::CredentialError;
use seriescache::error::ProviderError;
use seriescache::error::StoreError;
use seriescache::model::CacheRecord;
use seriescache::model::DailyValue;
use seriescache::model::DateRange;
use seriescache::model::SeriesKey;
use seriescache::provider::ChannelScope;
use seriescache::provider::FetchAdapter;
use seriescache::resolver::CoverageResolver;
use seriescache::store::CoverageStore;
use seriescache::store::InMemoryCoverageStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

/// Fake provider: serves sparse daily rows from a fixed dataset and records
/// every fetch it receives.
#[derive(Default)]
struct FakeProvider {
    daily_rows: Vec<DailyValue>,
    calls: Mutex<Vec<(Metric, DateRange)>>,
    fail_next: Mutex<Option<ProviderError>>,
    fetch_delay: Option<Duration>,
}

impl FakeProvider {
    fn with_rows(rows: Vec<DailyValue>) -> Self {
        Self {
            daily_rows: rows,
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            fetch_delay: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(Metric, DateRange)> {
        self.calls.lock().unwrap().clone()
    }

    fn fail_next(&self, err: ProviderError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl FetchAdapter for FakeProvider {
    async fn fetch(
        &self,
        _credential: &Credential,
        metric: Metric,
        _scope: &ChannelScope,
        range: DateRange,
    ) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push((metric, range));
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        if metric.is_daily() {
            let rows: Vec<Value> = self
                .daily_rows
                .iter()
                .filter(|row| range.contains(row.date))
                .map(|row| json!([row.date.to_string(), row.value]))
                .collect();
            Ok(json!({ "rows": rows }))
        } else {
            Ok(json!({
                "items": [{
                    "id": { "videoId": "vid-1" },
                    "snippet": { "title": "First upload" },
                }],
            }))
        }
    }
}

/// Store wrapper that delegates reads but fails every write while armed,
/// to exercise the discard-on-store-failure path.
struct FlakyStore {
    inner: InMemoryCoverageStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryCoverageStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_error(&self) -> Option<StoreError> {
        self.fail_writes
            .load(Ordering::SeqCst)
            .then(|| StoreError::storage("disk full"))
    }
}

#[async_trait]
impl CoverageStore for FlakyStore {
    async fn get(&self, key: &SeriesKey) -> Result<Option<CacheRecord>, StoreError> {
        self.inner.get(key).await
    }

    async fn create(&self, record: CacheRecord) -> Result<(), StoreError> {
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        self.inner.create(record).await
    }

    async fn replace(&self, record: CacheRecord) -> Result<(), StoreError> {
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        self.inner.replace(record).await
    }

    async fn extend(
        &self,
        key: &SeriesKey,
        appended: Vec<DailyValue>,
        new_end: NaiveDate,
        new_last_date: NaiveDate,
    ) -> Result<(), StoreError> {
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        self.inner.extend(key, appended, new_end, new_last_date).await
    }

    async fn remove(&self, key: &SeriesKey) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

/// Adapter that parks every fetch on a shared barrier, so a test can prove
/// two fetches were in flight at the same time.
struct BarrierProvider {
    barrier: tokio::sync::Barrier,
    calls: Mutex<Vec<Metric>>,
}

impl BarrierProvider {
    fn new(parties: usize) -> Self {
        Self {
            barrier: tokio::sync::Barrier::new(parties),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FetchAdapter for BarrierProvider {
    async fn fetch(
        &self,
        _credential: &Credential,
        metric: Metric,
        _scope: &ChannelScope,
        _range: DateRange,
    ) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(metric);
        self.barrier.wait().await;
        Ok(json!({ "rows": [] }))
    }
}

struct Harness {
    provider: Arc<FakeProvider>,
    store: Arc<InMemoryCoverageStore>,
    resolver: CoverageResolver,
    owner: Uuid,
}

impl Harness {
    fn new(min_history_days: u32, provider: FakeProvider) -> Self {
        let owner = Uuid::new_v4();
        let provider = Arc::new(provider);
        let store = Arc::new(InMemoryCoverageStore::new());
        let credentials =
            StaticCredentialManager::new().with_credential(owner, Credential::new("token"));
        let resolver = CoverageResolver::new(
            provider.clone(),
            Arc::new(credentials),
            store.clone(),
            CacheConfig::default().with_min_history_days(min_history_days),
        );
        Self {
            provider,
            store,
            resolver,
            owner,
        }
    }

    fn key(&self, metric: Metric) -> SeriesKey {
        SeriesKey::new(self.owner, "UC123", metric)
    }

    /// Seeds a stored record directly, bypassing the resolver.
    async fn seed(&self, metric: Metric, window: DateRange, last_date: NaiveDate, rows: Vec<DailyValue>) {
        let values = seriescache::densify::densify(&rows, window);
        let record = CacheRecord::new(self.key(metric), window, last_date, values).unwrap();
        self.store.create(record).await.unwrap();
    }
}

#[tokio::test]
async fn test_bootstrap_creates_full_trailing_window() {
    let harness = Harness::new(
        90,
        FakeProvider::with_rows(vec![DailyValue::new(date(2024, 2, 1), 17)]),
    );

    let resolved = harness
        .resolver
        .resolve(&harness.key(Metric::Views), date(2024, 3, 10))
        .await
        .unwrap();

    assert_eq!(resolved.action, CoverageAction::Created);
    assert_eq!(
        harness.provider.calls(),
        vec![(Metric::Views, range(date(2023, 12, 11), date(2024, 3, 9)))]
    );

    let series = resolved.data().as_daily().unwrap();
    assert_eq!(series.len(), 90);
    assert_eq!(series[0].date, date(2023, 12, 11));
    assert_eq!(series[89].date, date(2024, 3, 9));
    let total: i64 = series.iter().map(|v| v.value).sum();
    assert_eq!(total, 17);

    let record = harness
        .store
        .get(&harness.key(Metric::Views))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.values.len(), 90);
    assert_eq!(record.last_date, date(2024, 2, 1));
}

#[tokio::test]
async fn test_second_read_is_a_hit_with_no_fetch() {
    let harness = Harness::new(90, FakeProvider::default());
    let key = harness.key(Metric::Likes);
    let today = date(2024, 3, 10);

    let first = harness.resolver.resolve(&key, today).await.unwrap();
    let second = harness.resolver.resolve(&key, today).await.unwrap();

    assert_eq!(first.action, CoverageAction::Created);
    assert_eq!(second.action, CoverageAction::Hit);
    assert_eq!(harness.provider.calls().len(), 1);
    assert_eq!(first.data(), second.data());
}

#[tokio::test]
async fn test_forward_extension_fetches_only_the_tail() {
    // Stored: [2024-01-01, 2024-02-01], fully fetched, one non-zero day.
    let harness = Harness::new(36, FakeProvider::default());
    harness
        .seed(
            Metric::Views,
            range(date(2024, 1, 1), date(2024, 2, 1)),
            date(2024, 2, 1),
            vec![DailyValue::new(date(2024, 1, 15), 42)],
        )
        .await;

    // Desired window [2024-01-01, 2024-02-05].
    let resolved = harness
        .resolver
        .resolve(&harness.key(Metric::Views), date(2024, 2, 6))
        .await
        .unwrap();

    let fetched = range(date(2024, 2, 2), date(2024, 2, 5));
    assert_eq!(resolved.action, CoverageAction::Extended { fetched });
    assert_eq!(harness.provider.calls(), vec![(Metric::Views, fetched)]);

    let series = resolved.data().as_daily().unwrap();
    assert_eq!(series.len(), 36);
    for entry in series {
        let expected = if entry.date == date(2024, 1, 15) { 42 } else { 0 };
        assert_eq!(entry.value, expected, "day {}", entry.date);
    }

    let record = harness
        .store
        .get(&harness.key(Metric::Views))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.range, range(date(2024, 1, 1), date(2024, 2, 5)));
    assert_eq!(record.values.len(), 36);
}

#[tokio::test]
async fn test_extension_resumes_from_lagging_last_date() {
    // last_date lags the stored end by two days; the fetch resumes from
    // last_date + 1 but the stored prefix stays untouched.
    let provider = FakeProvider::with_rows(vec![
        DailyValue::new(date(2024, 1, 30), 5),
        DailyValue::new(date(2024, 2, 3), 7),
    ]);
    let harness = Harness::new(34, provider);
    harness
        .seed(
            Metric::Views,
            range(date(2024, 1, 1), date(2024, 1, 31)),
            date(2024, 1, 29),
            vec![],
        )
        .await;

    let resolved = harness
        .resolver
        .resolve(&harness.key(Metric::Views), date(2024, 2, 5))
        .await
        .unwrap();

    let fetched = range(date(2024, 1, 30), date(2024, 2, 4));
    assert_eq!(resolved.action, CoverageAction::Extended { fetched });

    let record = harness
        .store
        .get(&harness.key(Metric::Views))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.range, range(date(2024, 1, 1), date(2024, 2, 4)));
    // Jan 30 was already stored as zero and is not rewritten; Feb 3 lands.
    let by_date = |d: NaiveDate| record.values.iter().find(|v| v.date == d).unwrap().value;
    assert_eq!(by_date(date(2024, 1, 30)), 0);
    assert_eq!(by_date(date(2024, 2, 3)), 7);
    assert_eq!(record.last_date, date(2024, 2, 3));
}

#[tokio::test]
async fn test_rewindow_replaces_the_whole_record() {
    let provider = FakeProvider::with_rows(vec![DailyValue::new(date(2024, 1, 2), 9)]);
    let harness = Harness::new(35, provider);
    harness
        .seed(
            Metric::Views,
            range(date(2024, 1, 5), date(2024, 2, 1)),
            date(2024, 2, 1),
            vec![],
        )
        .await;

    // Desired window [2024-01-01, 2024-02-04] starts before the stored one
    // and also ends after it; the replace branch wins the tie-break.
    let resolved = harness
        .resolver
        .resolve(&harness.key(Metric::Views), date(2024, 2, 5))
        .await
        .unwrap();

    assert_eq!(resolved.action, CoverageAction::Replaced);
    assert_eq!(
        harness.provider.calls(),
        vec![(Metric::Views, range(date(2024, 1, 1), date(2024, 2, 4)))]
    );

    let record = harness
        .store
        .get(&harness.key(Metric::Views))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.range, range(date(2024, 1, 1), date(2024, 2, 4)));
    assert_eq!(record.values.len(), 35);
    assert_eq!(record.values[1].value, 9);
}

#[tokio::test]
async fn test_missing_credential_aborts_before_any_fetch() {
    let provider = Arc::new(FakeProvider::default());
    let resolver = CoverageResolver::new(
        provider.clone(),
        Arc::new(StaticCredentialManager::new()),
        Arc::new(InMemoryCoverageStore::new()),
        CacheConfig::default(),
    );
    let key = SeriesKey::new(Uuid::new_v4(), "UC123", Metric::Views);

    let err = resolver.resolve(&key, date(2024, 3, 10)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Credential(CredentialError::Missing { .. })
    ));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_provider_failure_leaves_store_untouched() {
    let harness = Harness::new(34, FakeProvider::default());
    let window = range(date(2024, 1, 1), date(2024, 1, 31));
    harness
        .seed(Metric::Views, window, date(2024, 1, 31), vec![])
        .await;
    let before = harness
        .store
        .get(&harness.key(Metric::Views))
        .await
        .unwrap()
        .unwrap();

    harness.provider.fail_next(ProviderError::Unauthorized);
    let err = harness
        .resolver
        .resolve(&harness.key(Metric::Views), date(2024, 2, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::Unauthorized)));

    let after = harness
        .store
        .get(&harness.key(Metric::Views))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_entity_metric_refetches_every_call() {
    let harness = Harness::new(90, FakeProvider::default());
    let key = harness.key(Metric::Videos);
    let today = date(2024, 3, 10);

    for _ in 0..2 {
        let resolved = harness.resolver.resolve(&key, today).await.unwrap();
        assert_eq!(resolved.action, CoverageAction::Refetched);
        let SeriesData::Catalog(entries) = resolved.data() else {
            panic!("expected catalog data");
        };
        assert_eq!(entries[0].id, "vid-1");
    }
    assert_eq!(harness.provider.calls().len(), 2);
    assert!(harness.store.get(&key).await.unwrap().is_none());
}

fn resolver_over(
    provider: Arc<dyn FetchAdapter>,
    store: Arc<dyn CoverageStore>,
    owner: Uuid,
    min_history_days: u32,
) -> CoverageResolver {
    let credentials =
        StaticCredentialManager::new().with_credential(owner, Credential::new("token"));
    CoverageResolver::new(
        provider,
        Arc::new(credentials),
        store,
        CacheConfig::default().with_min_history_days(min_history_days),
    )
}

#[tokio::test]
async fn test_store_create_failure_discards_fetched_data() {
    let owner = Uuid::new_v4();
    let provider = Arc::new(FakeProvider::with_rows(vec![DailyValue::new(
        date(2024, 3, 1),
        3,
    )]));
    let store = Arc::new(FlakyStore::new());
    let resolver = resolver_over(provider.clone(), store.clone(), owner, 7);
    let key = SeriesKey::new(owner, "UC123", Metric::Views);

    store.fail_writes(true);
    let err = resolver.resolve(&key, date(2024, 3, 5)).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Storage { .. })));
    assert_eq!(provider.calls().len(), 1);
    assert!(store.get(&key).await.unwrap().is_none());

    // Nothing was cached, so the next read refetches from scratch.
    store.fail_writes(false);
    let resolved = resolver.resolve(&key, date(2024, 3, 5)).await.unwrap();
    assert_eq!(resolved.action, CoverageAction::Created);
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_store_extend_failure_leaves_record_untouched() {
    let owner = Uuid::new_v4();
    let provider = Arc::new(FakeProvider::default());
    let store = Arc::new(FlakyStore::new());
    let resolver = resolver_over(provider.clone(), store.clone(), owner, 34);
    let key = SeriesKey::new(owner, "UC123", Metric::Views);

    let window = range(date(2024, 1, 1), date(2024, 1, 31));
    let values = seriescache::densify::densify(&[], window);
    let record = CacheRecord::new(key.clone(), window, date(2024, 1, 31), values).unwrap();
    store.create(record.clone()).await.unwrap();

    store.fail_writes(true);
    let err = resolver.resolve(&key, date(2024, 2, 5)).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Storage { .. })));
    assert_eq!(store.get(&key).await.unwrap().unwrap(), record);

    store.fail_writes(false);
    let resolved = resolver.resolve(&key, date(2024, 2, 5)).await.unwrap();
    assert!(matches!(resolved.action, CoverageAction::Extended { .. }));
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_concurrent_same_key_resolves_fetch_once() {
    let harness = Harness::new(30, FakeProvider::slow(Duration::from_millis(10)));
    let key = harness.key(Metric::Views);
    let today = date(2024, 3, 10);

    let (first, second) = tokio::join!(
        harness.resolver.resolve(&key, today),
        harness.resolver.resolve(&key, today),
    );

    let actions = [first.unwrap().action, second.unwrap().action];
    assert_eq!(harness.provider.calls().len(), 1);
    assert!(actions.contains(&CoverageAction::Created));
    assert!(actions.contains(&CoverageAction::Hit));
}

#[tokio::test]
async fn test_distinct_keys_resolve_in_parallel() {
    let owner = Uuid::new_v4();
    let provider = Arc::new(BarrierProvider::new(2));
    let store = Arc::new(InMemoryCoverageStore::new());
    let resolver = resolver_over(provider.clone(), store, owner, 7);
    let views = SeriesKey::new(owner, "UC123", Metric::Views);
    let likes = SeriesKey::new(owner, "UC123", Metric::Likes);
    let today = date(2024, 3, 10);

    // Each fetch parks on the barrier until the other arrives; if distinct
    // keys shared a lock this would never complete.
    let (first, second) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            resolver.resolve(&views, today),
            resolver.resolve(&likes, today),
        )
    })
    .await
    .unwrap();

    assert_eq!(first.unwrap().action, CoverageAction::Created);
    assert_eq!(second.unwrap().action, CoverageAction::Created);
    assert_eq!(provider.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_facade_round_trip() {
    let owner = Uuid::new_v4();
    let cache = SeriesCache::builder()
        .adapter(FakeProvider::with_rows(vec![DailyValue::new(
            date(2024, 3, 1),
            3,
        )]))
        .credentials(
            StaticCredentialManager::new().with_credential(owner, Credential::new("token")),
        )
        .config(CacheConfig::default().with_min_history_days(7))
        .build();

    let resolved = cache
        .get_metric_series_at(owner, "UC123", Metric::Views, date(2024, 3, 5))
        .await
        .unwrap();
    assert_eq!(resolved.action, CoverageAction::Created);
    let series = resolved.into_inner();
    let series = series.as_daily().unwrap().to_vec();
    assert_eq!(series.len(), 7);
    assert_eq!(series[0].date, date(2024, 2, 27));
    assert_eq!(
        series.iter().find(|v| v.date == date(2024, 3, 1)).unwrap().value,
        3
    );
}

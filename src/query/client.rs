use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::key::QueryKey;
use crate::remote::ApiError;

/// How long a fetched value is served without refetching
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// How long an unused, unsubscribed entry is kept before eviction
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

type CachedValue = Arc<dyn Any + Send + Sync>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<CachedValue, ApiError>> + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, Result<CachedValue, QueryError>>>;

/// Query-level failure handed to views
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Api(Arc<ApiError>),

    #[error("fetch for {0} did not complete")]
    Aborted(String),

    #[error("cached value for {0} has an unexpected type")]
    TypeMismatch(String),
}

impl QueryError {
    /// Underlying adapter error, when there is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            QueryError::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    /// Retry a failed fetch once. There is never a second retry.
    pub retry: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            retry: true,
        }
    }
}

struct Entry {
    key: QueryKey,
    value: Option<CachedValue>,
    updated_at: Option<Instant>,
    invalidated: bool,
    /// Bumped on every invalidation; fetches started under an older
    /// generation are discarded when they land.
    generation: u64,
    next_fetch_id: u64,
    in_flight: Option<(u64, InFlight)>,
    fetcher: Option<Fetcher>,
    options: QueryOptions,
    subscribers: usize,
    last_used: Instant,
}

impl Entry {
    fn new(key: QueryKey, options: QueryOptions) -> Self {
        Self {
            key,
            value: None,
            updated_at: None,
            invalidated: false,
            generation: 0,
            next_fetch_id: 0,
            in_flight: None,
            fetcher: None,
            options,
            subscribers: 0,
            last_used: Instant::now(),
        }
    }

    fn fresh_value(&self, now: Instant) -> Option<CachedValue> {
        if self.invalidated {
            return None;
        }
        let updated_at = self.updated_at?;
        if now.duration_since(updated_at) >= self.options.stale_time {
            return None;
        }
        self.value.clone()
    }
}

struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    defaults: QueryOptions,
    gc_time: Duration,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn a fetch for `entry` and record it as the entry's in-flight request.
    ///
    /// The fetch runs as its own task, so it completes even when every caller
    /// waiting on it has gone away.
    fn start_fetch(inner: &Arc<Inner>, entry: &mut Entry, fetcher: Fetcher) -> InFlight {
        let generation = entry.generation;
        let fetch_id = entry.next_fetch_id;
        entry.next_fetch_id += 1;

        let retry = entry.options.retry;
        let canonical = entry.key.canonical().to_string();
        let label = canonical.clone();
        let weak = Arc::downgrade(inner);

        let task = tokio::spawn(async move {
            let result = run_fetch(&fetcher, retry, &label).await;
            if let Some(inner) = weak.upgrade() {
                inner.complete(&label, generation, fetch_id, &result);
            }
            result
        });

        let in_flight = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Fetch task for {} ended abnormally: {}", canonical, e);
                    Err(QueryError::Aborted(canonical))
                }
            }
        }
        .boxed()
        .shared();

        entry.in_flight = Some((fetch_id, in_flight.clone()));
        in_flight
    }

    fn complete(
        &self,
        canonical: &str,
        generation: u64,
        fetch_id: u64,
        result: &Result<CachedValue, QueryError>,
    ) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(canonical) else {
            debug!("Entry {} was evicted before its fetch landed", canonical);
            return;
        };

        if matches!(entry.in_flight, Some((id, _)) if id == fetch_id) {
            entry.in_flight = None;
        }

        if entry.generation != generation {
            debug!("Discarding response for {} fetched before invalidation", canonical);
            return;
        }

        if let Ok(value) = result {
            entry.value = Some(value.clone());
            entry.updated_at = Some(Instant::now());
            entry.invalidated = false;
        }
    }
}

async fn run_fetch(fetcher: &Fetcher, retry: bool, key: &str) -> Result<CachedValue, QueryError> {
    match fetcher().await {
        Ok(value) => Ok(value),
        Err(err) if retry => {
            warn!("Fetch for {} failed, retrying once: {}", key, err);
            fetcher().await.map_err(|err| {
                warn!("Fetch for {} failed again: {}", key, err);
                QueryError::Api(Arc::new(err))
            })
        }
        Err(err) => {
            warn!("Fetch for {} failed: {}", key, err);
            Err(QueryError::Api(Arc::new(err)))
        }
    }
}

fn erase<T, F, Fut>(fetch: F) -> Fetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    Arc::new(move || {
        let fut = fetch();
        async move { fut.await.map(|value| Arc::new(value) as CachedValue) }.boxed()
    })
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: CachedValue) -> Result<T, QueryError> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| QueryError::TypeMismatch(key.to_string()))
}

/// Process-wide cache of fetched values keyed by [`QueryKey`].
///
/// Cloning is cheap and every clone shares the same store. The store lock is
/// only taken for bookkeeping and never held across an `.await`.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new(defaults: QueryOptions, gc_time: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                defaults,
                gc_time,
            }),
        }
    }

    pub fn defaults(&self) -> QueryOptions {
        self.inner.defaults
    }

    /// Fetch through the cache with the client's default options
    pub async fn query<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<T, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.query_with(key, fetch, self.defaults()).await
    }

    /// Return the fresh cached value for `key`, join the in-flight fetch for
    /// it, or start a new fetch.
    pub async fn query_with<T, F, Fut>(
        &self,
        key: &QueryKey,
        fetch: F,
        options: QueryOptions,
    ) -> Result<T, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let fetcher = erase(fetch);
        let in_flight = {
            let mut entries = self.inner.entries();
            let entry = entries
                .entry(key.canonical().to_string())
                .or_insert_with(|| Entry::new(key.clone(), options));

            let now = Instant::now();
            entry.last_used = now;
            entry.options = options;
            entry.fetcher = Some(fetcher.clone());

            if let Some(value) = entry.fresh_value(now) {
                debug!("Cache hit for {}", key);
                return downcast(key, value);
            }

            match &entry.in_flight {
                Some((_, in_flight)) => {
                    debug!("Joining in-flight fetch for {}", key);
                    in_flight.clone()
                }
                None => {
                    debug!("Fetching {}", key);
                    Inner::start_fetch(&self.inner, entry, fetcher)
                }
            }
        };

        let value = in_flight.await?;
        downcast(key, value)
    }

    /// Mark `key` as viewed. While the returned handle lives, invalidating the
    /// key triggers a background refetch with `fetch`.
    pub fn subscribe<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Subscription
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut entries = self.inner.entries();
        let defaults = self.inner.defaults;
        let entry = entries
            .entry(key.canonical().to_string())
            .or_insert_with(|| Entry::new(key.clone(), defaults));
        entry.subscribers += 1;
        entry.fetcher = Some(erase(fetch));
        entry.last_used = Instant::now();

        Subscription {
            inner: Arc::downgrade(&self.inner),
            key: key.clone(),
        }
    }

    /// Run a mutation. Only after it succeeds, every entry under one of the
    /// `invalidate` prefixes is marked stale. A failed mutation leaves the
    /// cache untouched.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, invalidate: &[QueryKey]) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match mutation.await {
            Ok(value) => {
                let count = self.invalidate_queries(invalidate);
                debug!("Mutation succeeded, invalidated {} cached queries", count);
                Ok(value)
            }
            Err(err) => {
                warn!("Mutation failed, cache left untouched: {}", err);
                Err(err)
            }
        }
    }

    /// Mark every entry matching any prefix as stale and refetch the
    /// subscribed ones in the background. Returns the number of entries hit.
    pub fn invalidate_queries(&self, prefixes: &[QueryKey]) -> usize {
        let mut entries = self.inner.entries();
        let mut count = 0;

        for entry in entries.values_mut() {
            if !prefixes.iter().any(|prefix| entry.key.starts_with(prefix)) {
                continue;
            }
            count += 1;
            entry.generation += 1;
            entry.invalidated = true;
            entry.in_flight = None;

            if entry.subscribers > 0 {
                if let Some(fetcher) = entry.fetcher.clone() {
                    debug!("Refetching subscribed query {} in the background", entry.key);
                    Inner::start_fetch(&self.inner, entry, fetcher);
                }
            }
        }

        count
    }

    /// Store a value directly, superseding any fetch in flight for the key
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        let mut entries = self.inner.entries();
        let defaults = self.inner.defaults;
        let entry = entries
            .entry(key.canonical().to_string())
            .or_insert_with(|| Entry::new(key.clone(), defaults));

        entry.generation += 1;
        entry.in_flight = None;
        entry.value = Some(Arc::new(value));
        entry.updated_at = Some(Instant::now());
        entry.invalidated = false;
        entry.last_used = Instant::now();
    }

    /// Cached value for `key`, fresh or not
    pub fn get_query_data<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.inner.entries();
        let value = entries.get(key.canonical())?.value.clone()?;
        value.downcast_ref::<T>().cloned()
    }

    #[cfg(test)]
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        let entries = self.inner.entries();
        entries
            .get(key.canonical())
            .and_then(|entry| entry.fresh_value(Instant::now()))
            .is_some()
    }

    /// Evict entries nobody watches, nobody is fetching, and nobody has used
    /// for the configured gc time. Returns the number evicted.
    pub fn collect_garbage(&self) -> usize {
        let gc_time = self.inner.gc_time;
        let now = Instant::now();
        let mut entries = self.inner.entries();
        let before = entries.len();

        entries.retain(|_, entry| {
            entry.subscribers > 0
                || entry.in_flight.is_some()
                || now.duration_since(entry.last_used) < gc_time
        });

        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }
}

/// Handle marking a key as currently viewed; dropping it ends the subscription.
pub struct Subscription {
    inner: Weak<Inner>,
    key: QueryKey,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut entries = inner.entries();
        if let Some(entry) = entries.get_mut(self.key.canonical()) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_used = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn client() -> QueryClient {
        QueryClient::new(QueryOptions::default(), DEFAULT_GC_TIME)
    }

    fn server_error() -> ApiError {
        ApiError::HttpStatus {
            path: "/jobs".to_string(),
            status: 500,
            body: "boom".to_string(),
        }
    }

    /// Fetcher returning the number of calls made so far
    fn counting(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> BoxFuture<'static, Result<usize, ApiError>> + Send + Sync + Clone + 'static
    {
        let calls = calls.clone();
        move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                Ok(n)
            }
            .boxed()
        }
    }

    /// Fetcher failing the first `failures` calls
    fn flaky(
        calls: &Arc<AtomicUsize>,
        failures: usize,
    ) -> impl Fn() -> BoxFuture<'static, Result<usize, ApiError>> + Send + Sync + Clone + 'static
    {
        let calls = calls.clone();
        move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= failures {
                    Err(server_error())
                } else {
                    Ok(n)
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_fresh_value_served_from_cache() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("jobs").with(0).with(20);

        let first: usize = cache.query(&key, counting(&calls, Duration::ZERO)).await.unwrap();
        let second: usize = cache.query(&key, counting(&calls, Duration::ZERO)).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_value_refetched_once() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("stats");
        let options = QueryOptions {
            stale_time: Duration::from_millis(30),
            retry: true,
        };

        let _: usize = cache
            .query_with(&key, counting(&calls, Duration::ZERO), options)
            .await
            .unwrap();
        sleep(Duration::from_millis(60)).await;

        let refreshed: usize = cache
            .query_with(&key, counting(&calls, Duration::ZERO), options)
            .await
            .unwrap();
        let cached: usize = cache
            .query_with(&key, counting(&calls, Duration::ZERO), options)
            .await
            .unwrap();

        assert_eq!(refreshed, 2);
        assert_eq!(cached, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_one_fetch() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("job").with(5);
        let fetch = counting(&calls, Duration::from_millis(30));

        let (a, b) = tokio::join!(
            cache.query::<usize, _, _>(&key, fetch.clone()),
            cache.query::<usize, _, _>(&key, fetch.clone()),
        );

        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_retried_once() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("stats");

        let value: usize = cache.query(&key, flaky(&calls, 1)).await.unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_never_retries_twice() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("stats");

        let err = cache
            .query::<usize, _, _>(&key, flaky(&calls, usize::MAX))
            .await
            .unwrap_err();

        assert_eq!(err.api_error().and_then(ApiError::status), Some(500));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_can_be_disabled() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("stats");
        let options = QueryOptions {
            retry: false,
            ..QueryOptions::default()
        };

        let result = cache
            .query_with::<usize, _, _>(&key, flaky(&calls, 1), options)
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_not_cached() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("stats");

        assert!(cache.query::<usize, _, _>(&key, flaky(&calls, 2)).await.is_err());
        let value: usize = cache.query(&key, flaky(&calls, 2)).await.unwrap();

        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_mutation_invalidates_matching_prefixes_only() {
        let cache = client();
        let job_calls = Arc::new(AtomicUsize::new(0));
        let fav_calls = Arc::new(AtomicUsize::new(0));
        let jobs_key = QueryKey::new("jobs").with(0).with(20);
        let favorites_key = QueryKey::new("favorites").with(0).with(20);

        let _: usize = cache.query(&jobs_key, counting(&job_calls, Duration::ZERO)).await.unwrap();
        let _: usize = cache
            .query(&favorites_key, counting(&fav_calls, Duration::ZERO))
            .await
            .unwrap();

        cache
            .mutate(async { Ok::<_, ApiError>(()) }, &[QueryKey::new("jobs")])
            .await
            .unwrap();
        assert!(!cache.is_fresh(&jobs_key));
        assert!(cache.is_fresh(&favorites_key));

        let jobs: usize = cache.query(&jobs_key, counting(&job_calls, Duration::ZERO)).await.unwrap();
        let favorites: usize = cache
            .query(&favorites_key, counting(&fav_calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(jobs, 2);
        assert_eq!(favorites, 1);
        assert_eq!(job_calls.load(Ordering::SeqCst), 2);
        assert_eq!(fav_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("jobs").with(0);

        let _: usize = cache.query(&key, counting(&calls, Duration::ZERO)).await.unwrap();
        let result = cache
            .mutate(async { Err::<(), _>(server_error()) }, &[QueryKey::new("jobs")])
            .await;

        assert!(result.is_err());
        assert!(cache.is_fresh(&key));
        let _: usize = cache.query(&key, counting(&calls, Duration::ZERO)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribed_query_refetched_after_invalidation() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("favorites").with(0).with(20);
        let fetch = counting(&calls, Duration::ZERO);

        let _subscription = cache.subscribe(&key, fetch.clone());
        let _: usize = cache.query(&key, fetch.clone()).await.unwrap();

        cache.invalidate_queries(&[QueryKey::new("favorites")]);
        sleep(Duration::from_millis(30)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get_query_data::<usize>(&key), Some(2));
        assert!(cache.is_fresh(&key));
    }

    #[tokio::test]
    async fn test_unsubscribed_query_waits_for_next_access() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("favorites").with(0).with(20);
        let fetch = counting(&calls, Duration::ZERO);

        drop(cache.subscribe(&key, fetch.clone()));
        let _: usize = cache.query(&key, fetch.clone()).await.unwrap();

        cache.invalidate_queries(&[QueryKey::new("favorites")]);
        sleep(Duration::from_millis(30)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_landing_after_invalidation_is_discarded() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("job").with(1);
        let fetch = counting(&calls, Duration::from_millis(50));

        let (early, _) = tokio::join!(cache.query::<usize, _, _>(&key, fetch.clone()), async {
            sleep(Duration::from_millis(10)).await;
            cache.invalidate_queries(&[QueryKey::new("job")])
        });

        // The caller that asked before the mutation still gets its answer,
        // but the cache does not keep it.
        assert_eq!(early.unwrap(), 1);
        assert_eq!(cache.get_query_data::<usize>(&key), None);

        let fresh: usize = cache.query(&key, fetch).await.unwrap();
        assert_eq!(fresh, 2);
    }

    #[tokio::test]
    async fn test_set_query_data_is_served() {
        let cache = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("job").with(9);

        cache.set_query_data(&key, 99usize);
        let value: usize = cache.query(&key, counting(&calls, Duration::ZERO)).await.unwrap();

        assert_eq!(value, 99);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_an_error() {
        let cache = client();
        let key = QueryKey::new("stats");

        cache.set_query_data(&key, 1u32);
        let err = cache
            .query::<String, _, _>(&key, || async { Ok::<_, ApiError>(String::new()) })
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::TypeMismatch(_)));
    }

    #[tokio::test]
    async fn test_garbage_collection_spares_subscribed_entries() {
        let cache = QueryClient::new(QueryOptions::default(), Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let watched = QueryKey::new("jobs").with(0);
        let idle = QueryKey::new("jobs").with(1);

        let _subscription = cache.subscribe(&watched, counting(&calls, Duration::ZERO));
        let _: usize = cache.query(&watched, counting(&calls, Duration::ZERO)).await.unwrap();
        let _: usize = cache.query(&idle, counting(&calls, Duration::ZERO)).await.unwrap();

        assert_eq!(cache.collect_garbage(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_query_data::<usize>(&watched).is_some());
    }
}

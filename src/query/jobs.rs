use tracing::info;

use super::client::{QueryClient, QueryError, Subscription};
use super::key::QueryKey;
use crate::remote::{
    ApiError, Job, JobApiClient, JobStatus, JobSummary, NotificationSettings,
    NotificationSettingsUpdate, PageResponse, SearchRequest, Sort, StatsOverview,
};

/// A cacheable read against the Remote Job API
#[derive(Debug, Clone, PartialEq)]
pub enum JobQuery {
    List { page: u32, size: u32, sort: Sort },
    Search(SearchRequest),
    Detail(i64),
    Favorites { page: u32, size: u32 },
    Stats,
    Settings,
}

impl JobQuery {
    pub fn key(&self) -> QueryKey {
        match self {
            JobQuery::List { page, size, sort } => QueryKey::new("jobs")
                .with(page)
                .with(size)
                .with(sort.key.as_str())
                .with(sort.order.as_str()),
            JobQuery::Search(request) => QueryKey::new("jobs").with("search").with(request),
            JobQuery::Detail(id) => QueryKey::new("job").with(id),
            JobQuery::Favorites { page, size } => {
                QueryKey::new("favorites").with(page).with(size)
            }
            JobQuery::Stats => QueryKey::new("stats"),
            JobQuery::Settings => QueryKey::new("notificationSettings"),
        }
    }
}

/// Query groups a status change makes stale
pub fn status_invalidations() -> Vec<QueryKey> {
    vec![
        QueryKey::new("jobs"),
        QueryKey::new("job"),
        QueryKey::new("favorites"),
        QueryKey::new("stats"),
    ]
}

/// Query groups a favorite toggle makes stale
pub fn favorite_invalidations() -> Vec<QueryKey> {
    vec![
        QueryKey::new("jobs"),
        QueryKey::new("job"),
        QueryKey::new("favorites"),
        QueryKey::new("stats"),
    ]
}

pub fn settings_invalidations() -> Vec<QueryKey> {
    vec![QueryKey::new("notificationSettings")]
}

/// Job reads and mutations routed through the shared [`QueryClient`]
#[derive(Clone)]
pub struct JobQueries {
    cache: QueryClient,
    api: JobApiClient,
}

impl JobQueries {
    pub fn new(cache: QueryClient, api: JobApiClient) -> Self {
        Self { cache, api }
    }

    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }

    pub fn api(&self) -> &JobApiClient {
        &self.api
    }

    pub async fn jobs(
        &self,
        page: u32,
        size: u32,
        sort: Sort,
    ) -> Result<PageResponse<JobSummary>, QueryError> {
        let key = JobQuery::List { page, size, sort }.key();
        let api = self.api.clone();
        self.cache
            .query(&key, move || {
                let api = api.clone();
                async move { api.list_jobs(page, size, sort).await }
            })
            .await
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<PageResponse<JobSummary>, QueryError> {
        let key = JobQuery::Search(request.clone()).key();
        let api = self.api.clone();
        let request = request.clone();
        self.cache
            .query(&key, move || {
                let api = api.clone();
                let request = request.clone();
                async move { api.search_jobs(&request).await }
            })
            .await
    }

    pub async fn job(&self, id: i64) -> Result<Job, QueryError> {
        let key = JobQuery::Detail(id).key();
        let api = self.api.clone();
        self.cache
            .query(&key, move || {
                let api = api.clone();
                async move { api.get_job(id).await }
            })
            .await
    }

    pub async fn favorites(
        &self,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<JobSummary>, QueryError> {
        let key = JobQuery::Favorites { page, size }.key();
        let api = self.api.clone();
        self.cache
            .query(&key, move || {
                let api = api.clone();
                async move { api.list_favorites(page, size).await }
            })
            .await
    }

    pub async fn stats(&self) -> Result<StatsOverview, QueryError> {
        let key = JobQuery::Stats.key();
        let api = self.api.clone();
        self.cache
            .query(&key, move || {
                let api = api.clone();
                async move { api.get_stats().await }
            })
            .await
    }

    pub async fn settings(&self) -> Result<NotificationSettings, QueryError> {
        let key = JobQuery::Settings.key();
        let api = self.api.clone();
        self.cache
            .query(&key, move || {
                let api = api.clone();
                async move { api.get_settings().await }
            })
            .await
    }

    /// Subscribe to `query` so invalidation refetches it in the background
    pub fn watch(&self, query: &JobQuery) -> Subscription {
        let key = query.key();
        let api = self.api.clone();
        match query.clone() {
            JobQuery::List { page, size, sort } => self.cache.subscribe(&key, move || {
                let api = api.clone();
                async move { api.list_jobs(page, size, sort).await }
            }),
            JobQuery::Search(request) => self.cache.subscribe(&key, move || {
                let api = api.clone();
                let request = request.clone();
                async move { api.search_jobs(&request).await }
            }),
            JobQuery::Detail(id) => self.cache.subscribe(&key, move || {
                let api = api.clone();
                async move { api.get_job(id).await }
            }),
            JobQuery::Favorites { page, size } => self.cache.subscribe(&key, move || {
                let api = api.clone();
                async move { api.list_favorites(page, size).await }
            }),
            JobQuery::Stats => self.cache.subscribe(&key, move || {
                let api = api.clone();
                async move { api.get_stats().await }
            }),
            JobQuery::Settings => self.cache.subscribe(&key, move || {
                let api = api.clone();
                async move { api.get_settings().await }
            }),
        }
    }

    pub async fn update_status(&self, id: i64, status: JobStatus) -> Result<Job, ApiError> {
        let job = self
            .cache
            .mutate(self.api.update_status(id, status), &status_invalidations())
            .await?;
        info!("Job {} moved to {}", id, status.as_str());
        Ok(job)
    }

    pub async fn toggle_favorite(&self, id: i64) -> Result<Job, ApiError> {
        let job = self
            .cache
            .mutate(self.api.toggle_favorite(id), &favorite_invalidations())
            .await?;
        info!("Job {} favorite is now {}", id, job.is_favorite);
        Ok(job)
    }

    pub async fn save_settings(
        &self,
        update: &NotificationSettingsUpdate,
    ) -> Result<NotificationSettings, ApiError> {
        self.cache
            .mutate(self.api.update_settings(update), &settings_invalidations())
            .await
    }
}

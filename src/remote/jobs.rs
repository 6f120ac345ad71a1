use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use super::client::JobApiClient;
use super::error::ApiError;
use super::models::{
    Job, JobStatus, JobSummary, PageResponse, SearchRequest, Sort, StatsOverview,
    StatusUpdateRequest,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams<'a> {
    page: u32,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_by: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_order: Option<&'a str>,
}

/// Job endpoints
impl JobApiClient {
    /// `GET /jobs?page&size&sortBy&sortOrder`
    pub async fn list_jobs(
        &self,
        page: u32,
        size: u32,
        sort: Sort,
    ) -> Result<PageResponse<JobSummary>, ApiError> {
        let params = ListParams {
            page,
            size,
            sort_by: Some(sort.key.as_str()),
            sort_order: Some(sort.order.as_str()),
        };
        self.send_page(Method::GET, "/jobs", |req| req.query(&params))
            .await
    }

    /// `GET /jobs/{id}`
    pub async fn get_job(&self, id: i64) -> Result<Job, ApiError> {
        self.send(Method::GET, &format!("/jobs/{}", id), |req| req)
            .await
    }

    /// `POST /jobs/search`
    pub async fn search_jobs(
        &self,
        request: &SearchRequest,
    ) -> Result<PageResponse<JobSummary>, ApiError> {
        debug!("Searching jobs: {:?}", request);
        self.send_page(Method::POST, "/jobs/search", |req| req.json(request))
            .await
    }

    /// `PATCH /jobs/{id}/status`
    pub async fn update_status(&self, id: i64, status: JobStatus) -> Result<Job, ApiError> {
        let body = StatusUpdateRequest { status };
        self.send(Method::PATCH, &format!("/jobs/{}/status", id), |req| {
            req.json(&body)
        })
        .await
    }

    /// `POST /jobs/{id}/favorite`, flipping the favorite flag
    pub async fn toggle_favorite(&self, id: i64) -> Result<Job, ApiError> {
        self.send(Method::POST, &format!("/jobs/{}/favorite", id), |req| req)
            .await
    }

    /// `GET /jobs/favorites?page&size`
    pub async fn list_favorites(
        &self,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<JobSummary>, ApiError> {
        let params = ListParams {
            page,
            size,
            sort_by: None,
            sort_order: None,
        };
        self.send_page(Method::GET, "/jobs/favorites", |req| req.query(&params))
            .await
    }

    /// `GET /jobs/stats`
    pub async fn get_stats(&self) -> Result<StatsOverview, ApiError> {
        self.send(Method::GET, "/jobs/stats", |req| req).await
    }

    /// Reachability probe for the health endpoints
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.get_stats().await.map(|_| ())
    }
}

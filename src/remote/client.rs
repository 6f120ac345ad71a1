use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, warn};

use super::error::ApiError;
use super::models::PageResponse;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// HTTP client for the Remote Job API.
///
/// Every method issues exactly one request. Retrying is left to the query
/// cache, so a failure here is returned as-is.
#[derive(Clone)]
pub struct JobApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl JobApiClient {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:8080/api`)
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("job-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and decode the JSON body.
    ///
    /// `build` gets the request builder to attach a query string or body.
    pub(crate) async fn send<T>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let label = format!("{} {}", method, path);
        debug!("[API] {} -> {}", label, url);

        let start = Instant::now();
        let response = build(self.http.request(method, &url))
            .send()
            .await
            .map_err(|source| {
                warn!("[API] {} failed without a response: {}", label, source);
                ApiError::Network {
                    path: path.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| {
            warn!("[API] {} failed while reading the body: {}", label, source);
            ApiError::Network {
                path: path.to_string(),
                source,
            }
        })?;
        debug!("[API] {} answered {} in {:?}", label, status, start.elapsed());

        if !status.is_success() {
            warn!("[API] {} returned {}: {}", label, status, body);
            return Err(ApiError::HttpStatus {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("[API] {} returned an unexpected body: {}", label, e);
            ApiError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Like [`send`](Self::send) for endpoints answering with a page envelope,
    /// checking the envelope invariants after decoding.
    pub(crate) async fn send_page<T>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<PageResponse<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let page: PageResponse<T> = self.send(method, path, build).await?;
        page.check().map_err(|message| {
            warn!("[API] {} returned an inconsistent page: {}", path, message);
            ApiError::InvalidPage {
                path: path.to_string(),
                message,
            }
        })?;
        Ok(page)
    }
}

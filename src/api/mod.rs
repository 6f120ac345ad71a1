pub mod error;
pub mod health;
pub mod jobs;
pub mod settings;
pub mod stats;
pub mod validation;

use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse};

use self::error::PageError;

pub(crate) fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body)
}

/// Fallback for any path no route claims
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, PageError> {
    Err(PageError::NotFound(req.path().to_string()))
}

/// Every dashboard route, health probes included
pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::health_config)
        .configure(jobs::jobs_config)
        .configure(stats::stats_config)
        .configure(settings::settings_config);
}

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::warn;

use crate::views::error_page;

/// Request-level failures rendered as HTML error pages
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("bad request: {}", .0.join("; "))]
    BadRequest(Vec<String>),

    #[error("not found: {0}")]
    NotFound(String),
}

impl PageError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        PageError::BadRequest(vec![message.into()])
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        match self {
            PageError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PageError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            PageError::BadRequest(messages) => {
                warn!("Bad request: {}", messages.join("; "));
                HttpResponse::BadRequest()
                    .content_type(ContentType::html())
                    .body(error_page("Bad request", messages))
            }
            PageError::NotFound(path) => {
                warn!("No page at {}", path);
                HttpResponse::NotFound()
                    .content_type(ContentType::html())
                    .body(error_page("Page not found", &[]))
            }
        }
    }
}

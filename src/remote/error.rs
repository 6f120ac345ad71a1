/// Errors produced by the Remote Job API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("network error calling {path}: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("{path} returned HTTP {status}: {body}")]
    HttpStatus {
        path: String,
        status: u16,
        body: String,
    },

    /// The body did not match the expected JSON shape.
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    /// A pagination envelope broke its own invariants.
    #[error("inconsistent page from {path}: {message}")]
    InvalidPage { path: String, message: String },

    /// The payload was rejected locally and never sent.
    #[error("request rejected before sending: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl ApiError {
    /// HTTP status attached to the error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

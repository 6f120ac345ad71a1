//! Client for the Remote Job API: one typed method per backend operation.

pub mod client;
pub mod error;
pub mod jobs;
pub mod models;
pub mod notifications;

pub use client::{JobApiClient, DEFAULT_API_BASE_URL};
pub use error::ApiError;
pub use models::{
    Job, JobStatus, JobSummary, NotificationChannel, NotificationSettings,
    NotificationSettingsUpdate, PageResponse, RemoteType, SearchRequest, Sort, StatsOverview,
    TestNotificationResult,
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Remote-work category of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteType {
    Full,
    Partial,
    #[serde(rename = "NONE")]
    Onsite,
}

impl RemoteType {
    pub const ALL: [RemoteType; 3] = [RemoteType::Full, RemoteType::Partial, RemoteType::Onsite];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteType::Full => "FULL",
            RemoteType::Partial => "PARTIAL",
            RemoteType::Onsite => "NONE",
        }
    }
}

impl FromStr for RemoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FULL" => Ok(RemoteType::Full),
            "PARTIAL" => Ok(RemoteType::Partial),
            "NONE" => Ok(RemoteType::Onsite),
            other => Err(format!("unknown remote type: {}", other)),
        }
    }
}

/// Workflow status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    New,
    Read,
    Applied,
    Closed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::New,
        JobStatus::Read,
        JobStatus::Applied,
        JobStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "NEW",
            JobStatus::Read => "READ",
            JobStatus::Applied => "APPLIED",
            JobStatus::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    Monthly,
    Hourly,
}

/// Listing row as returned by list, search and favorites endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub max_price: Option<i32>,
    pub location: Option<String>,
    pub remote_type: Option<RemoteType>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub status: JobStatus,
    pub is_favorite: bool,
    pub posted_at: Option<NaiveDateTime>,
}

/// Full listing record, fetched when a card is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub source: String,
    pub source_url: String,
    pub source_id: Option<String>,
    pub title: String,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub price_type: Option<PriceType>,
    pub settlement_hours: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    pub experience_years: Option<String>,
    pub location: Option<String>,
    pub remote_type: Option<RemoteType>,
    pub work_days: Option<String>,
    pub start_date: Option<String>,
    pub contract_period: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub status: JobStatus,
    pub is_favorite: bool,
    pub posted_at: Option<NaiveDateTime>,
    pub crawled_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Job {
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            source: self.source.clone(),
            title: self.title.clone(),
            max_price: self.max_price,
            location: self.location.clone(),
            remote_type: self.remote_type,
            required_skills: self.required_skills.clone(),
            status: self.status,
            is_favorite: self.is_favorite,
            posted_at: self.posted_at,
        }
    }
}

/// Pagination envelope used by every list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> PageResponse<T> {
    /// Check the envelope invariants: content never exceeds the page size and
    /// a non-empty page lies inside the page range.
    pub fn check(&self) -> Result<(), String> {
        if self.content.len() > self.size as usize {
            return Err(format!(
                "page holds {} items but size is {}",
                self.content.len(),
                self.size
            ));
        }
        if !self.content.is_empty() && self.number >= self.total_pages {
            return Err(format!(
                "page number {} is outside {} total pages",
                self.number, self.total_pages
            ));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    CrawledAt,
    MaxPrice,
    PostedAt,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CrawledAt => "crawledAt",
            SortKey::MaxPrice => "maxPrice",
            SortKey::PostedAt => "postedAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort key and direction, written `crawledAt:desc` in page URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Sort {
    pub const fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Sort choices offered on the list page
    pub const CHOICES: [Sort; 5] = [
        Sort::new(SortKey::CrawledAt, SortOrder::Desc),
        Sort::new(SortKey::CrawledAt, SortOrder::Asc),
        Sort::new(SortKey::MaxPrice, SortOrder::Desc),
        Sort::new(SortKey::MaxPrice, SortOrder::Asc),
        Sort::new(SortKey::PostedAt, SortOrder::Desc),
    ];
}

impl Default for Sort {
    fn default() -> Self {
        Sort::new(SortKey::CrawledAt, SortOrder::Desc)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key.as_str(), self.order.as_str())
    }
}

impl FromStr for Sort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, order) = s
            .split_once(':')
            .ok_or_else(|| format!("sort must look like key:order, got {}", s))?;
        let key = match key {
            "crawledAt" => SortKey::CrawledAt,
            "maxPrice" => SortKey::MaxPrice,
            "postedAt" => SortKey::PostedAt,
            other => return Err(format!("unknown sort key: {}", other)),
        };
        let order = match order {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => return Err(format!("unknown sort order: {}", other)),
        };
        Ok(Sort { key, order })
    }
}

/// Filter and pagination body for `POST /jobs/search`.
///
/// Absent fields are left out of the JSON body and mean "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_type: Option<RemoteType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl SearchRequest {
    /// True when no filter field is set; sort and paging are ignored.
    pub fn is_unconstrained(&self) -> bool {
        self.keyword.is_none()
            && self.skills.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.location.is_none()
            && self.remote_type.is_none()
            && self.sources.is_empty()
    }

    pub fn sort(&self) -> Sort {
        let default = Sort::default();
        Sort::new(
            self.sort_by.unwrap_or(default.key),
            self.sort_order.unwrap_or(default.order),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total_jobs: u64,
    pub new_jobs: u64,
    pub favorite_jobs: u64,
    pub average_price: Option<f64>,
    #[serde(default)]
    pub jobs_by_source: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    pub status: JobStatus,
}

pub const DEFAULT_NOTIFY_INTERVAL_HOURS: u32 = 6;

/// Intervals the backend scheduler understands
pub const NOTIFY_INTERVALS: [u32; 5] = [1, 3, 6, 12, 24];

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn interval_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(DEFAULT_NOTIFY_INTERVAL_HOURS))
}

/// Notification settings as stored by the backend. Credentials are write-only
/// and never come back in this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_false")]
    pub email_enabled: bool,
    pub email_address: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub line_enabled: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub slack_enabled: bool,
    pub min_price_threshold: Option<i32>,
    pub skills_filter: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub remote_only: bool,
    #[serde(
        default = "default_interval",
        deserialize_with = "interval_or_default"
    )]
    pub notify_interval_hours: u32,
    pub last_notified_at: Option<NaiveDateTime>,
}

fn default_interval() -> u32 {
    DEFAULT_NOTIFY_INTERVAL_HOURS
}

/// Wholesale settings update sent by `PUT /notifications/settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_settings_update"))]
pub struct NotificationSettingsUpdate {
    pub email_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email address is not valid"))]
    pub email_address: Option<String>,
    pub line_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "LINE token is too long"))]
    pub line_token: Option<String>,
    pub slack_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Slack webhook must be a valid URL"))]
    pub slack_webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 1000, message = "Minimum price must be between 0 and 1000"))]
    pub min_price_threshold: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "Skill filter is too long"))]
    pub skills_filter: Option<String>,
    pub remote_only: bool,
    pub notify_interval_hours: u32,
}

impl Default for NotificationSettingsUpdate {
    fn default() -> Self {
        Self {
            email_enabled: false,
            email_address: None,
            line_enabled: false,
            line_token: None,
            slack_enabled: false,
            slack_webhook_url: None,
            min_price_threshold: None,
            skills_filter: None,
            remote_only: false,
            notify_interval_hours: DEFAULT_NOTIFY_INTERVAL_HOURS,
        }
    }
}

fn validate_settings_update(update: &NotificationSettingsUpdate) -> Result<(), ValidationError> {
    if !NOTIFY_INTERVALS.contains(&update.notify_interval_hours) {
        let mut err = ValidationError::new("notify_interval_hours");
        err.message = Some(Cow::from("Notification interval must be 1, 3, 6, 12 or 24 hours"));
        return Err(err);
    }
    if update.email_enabled && update.email_address.is_none() {
        let mut err = ValidationError::new("email_address");
        err.message = Some(Cow::from("Email address is required when email is enabled"));
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Line,
    Slack,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Line => "line",
            NotificationChannel::Slack => "slack",
        }
    }
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(NotificationChannel::Email),
            "line" => Ok(NotificationChannel::Line),
            "slack" => Ok(NotificationChannel::Slack),
            other => Err(format!("unknown notification channel: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestNotificationResult {
    pub success: bool,
    #[serde(default)]
    pub channel: Option<String>,
    pub message: String,
}

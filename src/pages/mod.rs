//! Page containers: URL-held UI state, the transitions between states and the
//! queries each page runs before it is rendered.

pub mod detail;
pub mod favorites;
pub mod form;
pub mod list;
pub mod settings;
pub mod stats;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

use crate::query::{JobQueries, JobQuery, QueryError, Subscription};
use crate::remote::PageResponse;

pub use detail::DetailView;
pub use favorites::{FavoritesEvent, FavoritesState, FavoritesView};
pub use list::{ListEvent, ListState, ListView, SearchFilter};
pub use settings::{SettingsDraft, SettingsView};
pub use stats::{SourceBar, StatsView};

/// What a page shows for one of its queries
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Not settled before the render deadline; the fetch keeps going
    Loading,
    Error(QueryError),
    Empty,
    Ready(T),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Wait up to `deadline` for a query.
pub async fn settle<T, F>(deadline: Duration, query: F) -> QueryState<T>
where
    F: Future<Output = Result<T, QueryError>>,
{
    match tokio::time::timeout(deadline, query).await {
        Ok(Ok(value)) => QueryState::Ready(value),
        Ok(Err(err)) => QueryState::Error(err),
        Err(_) => QueryState::Loading,
    }
}

/// Like [`settle`], with a page of no items reported as `Empty`
pub async fn settle_page<T, F>(deadline: Duration, query: F) -> QueryState<PageResponse<T>>
where
    F: Future<Output = Result<PageResponse<T>, QueryError>>,
{
    match settle(deadline, query).await {
        QueryState::Ready(page) if page.is_empty() => QueryState::Empty,
        other => other,
    }
}

/// One-shot message carried in the URL after a failed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Notice {
    FavoriteFailed,
    StatusFailed,
    MarkReadFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::FavoriteFailed => "Could not update the favorite. Please try again.",
            Notice::StatusFailed => "Could not update the status. Please try again.",
            Notice::MarkReadFailed => "Could not mark this job as read.",
        }
    }
}

/// Transient success/failure message at the top of a page
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub success: bool,
    pub message: String,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<Notice> for Banner {
    fn from(notice: Notice) -> Self {
        Banner::failure(notice.message())
    }
}

/// The query each page currently shows, kept subscribed so invalidation
/// refetches it in the background.
#[derive(Default)]
pub struct ActiveViews {
    views: Mutex<HashMap<&'static str, Subscription>>,
}

impl ActiveViews {
    pub fn show(&self, page: &'static str, queries: &JobQueries, query: &JobQuery) {
        let key = query.key();
        let previous = {
            let mut views = match self.views.lock() {
                Ok(views) => views,
                Err(poisoned) => poisoned.into_inner(),
            };
            if views.get(page).is_some_and(|current| current.key() == &key) {
                return;
            }
            views.insert(page, queries.watch(query))
        };
        // Released outside the lock: dropping a subscription touches the cache.
        drop(previous);
    }

    #[cfg(test)]
    pub fn current(&self, page: &str) -> Option<String> {
        let views = match self.views.lock() {
            Ok(views) => views,
            Err(poisoned) => poisoned.into_inner(),
        };
        views.get(page).map(|s| s.key().to_string())
    }

    pub fn clear(&self) {
        let drained: Vec<Subscription> = match self.views.lock() {
            Ok(mut views) => views.drain().map(|(_, s)| s).collect(),
            Err(poisoned) => poisoned.into_inner().drain().map(|(_, s)| s).collect(),
        };
        drop(drained);
    }
}

/// Jobs already moved from NEW to READ by this process.
///
/// Ids are never removed after a successful mark, so the set holds at most
/// one entry per job the backend has served, 8 bytes each.
#[derive(Debug, Default)]
pub struct ReadLedger {
    marked: Mutex<HashSet<i64>>,
}

impl ReadLedger {
    /// Returns true for the first caller only.
    pub fn claim(&self, id: i64) -> bool {
        match self.marked.lock() {
            Ok(mut marked) => marked.insert(id),
            Err(poisoned) => {
                warn!("Read ledger lock was poisoned");
                poisoned.into_inner().insert(id)
            }
        }
    }

    /// Give a claim back after the mark-read mutation failed
    pub fn release(&self, id: i64) {
        match self.marked.lock() {
            Ok(mut marked) => marked.remove(&id),
            Err(poisoned) => poisoned.into_inner().remove(&id),
        };
    }

    #[cfg(test)]
    pub fn contains(&self, id: i64) -> bool {
        match self.marked.lock() {
            Ok(marked) => marked.contains(&id),
            Err(poisoned) => poisoned.into_inner().contains(&id),
        }
    }
}

/// Query string for a page URL, without the leading `?`
pub(crate) fn encode_query<T: Serialize>(params: &T) -> String {
    match serde_urlencoded::to_string(params) {
        Ok(query) => query,
        Err(e) => {
            warn!("Failed to encode page state: {}", e);
            String::new()
        }
    }
}

pub(crate) fn page_url(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

use std::time::Duration;

use crate::pages::{ActiveViews, ReadLedger};
use crate::query::JobQueries;

/// Shared state handed to every handler through `web::Data`
pub struct AppState {
    pub queries: JobQueries,
    pub views: ActiveViews,
    pub read_ledger: ReadLedger,
    pub page_size: u32,
    /// How long a render waits for a query before showing the loading state
    pub render_timeout: Duration,
}

impl AppState {
    pub fn new(queries: JobQueries, page_size: u32, render_timeout: Duration) -> Self {
        AppState {
            queries,
            views: ActiveViews::default(),
            read_ledger: ReadLedger::default(),
            page_size,
            render_timeout,
        }
    }
}

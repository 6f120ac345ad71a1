use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::detail::{load_detail, DetailView};
use super::form::{self, join_list, split_list};
use super::{encode_query, page_url, settle_page, Notice, QueryState};
use crate::query::JobQuery;
use crate::remote::{JobSummary, PageResponse, RemoteType, SearchRequest, Sort};
use crate::state::AppState;

pub const LIST_PAGE: &str = "list";

/// List page state as it appears in the URL query string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_price_range"))]
pub struct ListParams {
    #[serde(default, deserialize_with = "form::trimmed", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Keyword is too long"))]
    pub q: Option<String>,

    #[serde(default, deserialize_with = "form::trimmed", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Skill list is too long"))]
    pub skills: Option<String>,

    #[serde(default, deserialize_with = "form::parsed", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 10000, message = "Minimum price must be between 0 and 10000"))]
    pub min_price: Option<i32>,

    #[serde(default, deserialize_with = "form::parsed", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 10000, message = "Maximum price must be between 0 and 10000"))]
    pub max_price: Option<i32>,

    #[serde(default, deserialize_with = "form::trimmed", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Location is too long"))]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "form::parsed", skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteType>,

    #[serde(default, deserialize_with = "form::trimmed", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Source list is too long"))]
    pub sources: Option<String>,

    #[serde(
        default,
        deserialize_with = "form::parsed",
        serialize_with = "form::display",
        skip_serializing_if = "Option::is_none"
    )]
    pub sort: Option<Sort>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 100000, message = "Page is out of range"))]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

fn validate_price_range(params: &ListParams) -> Result<(), ValidationError> {
    match (params.min_price, params.max_price) {
        (Some(min), Some(max)) if min > max => {
            let mut err = ValidationError::new("price_range");
            err.message = Some(Cow::from("Minimum price cannot exceed maximum price"));
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Criteria entered in the search filter panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub keyword: Option<String>,
    pub skills: Vec<String>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub location: Option<String>,
    pub remote_type: Option<RemoteType>,
    pub sources: Vec<String>,
}

impl SearchFilter {
    pub fn is_unconstrained(&self) -> bool {
        self.keyword.is_none() && !self.has_advanced()
    }

    /// Anything set beyond the keyword; keeps the filter panel expanded
    pub fn has_advanced(&self) -> bool {
        !self.skills.is_empty()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.location.is_some()
            || self.remote_type.is_some()
            || !self.sources.is_empty()
    }

    pub fn to_request(&self, sort: Sort, page: u32, size: u32) -> SearchRequest {
        SearchRequest {
            keyword: self.keyword.clone(),
            skills: self.skills.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            location: self.location.clone(),
            remote_type: self.remote_type,
            sources: self.sources.clone(),
            sort_by: Some(sort.key),
            sort_order: Some(sort.order),
            page: Some(page),
            size: Some(size),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    SubmitFilter(SearchFilter),
    ResetFilter,
    ChangePage(u32),
    ChangeSort(Sort),
    SelectJob(i64),
    CloseDetail,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub filter: SearchFilter,
    pub sort: Sort,
    pub page: u32,
    pub selected: Option<i64>,
    pub notice: Option<Notice>,
}

impl ListState {
    pub fn from_params(params: ListParams) -> Self {
        ListState {
            filter: SearchFilter {
                keyword: params.q,
                skills: split_list(params.skills.as_deref()),
                min_price: params.min_price,
                max_price: params.max_price,
                location: params.location,
                remote_type: params.remote,
                sources: split_list(params.sources.as_deref()),
            },
            sort: params.sort.unwrap_or_default(),
            page: params.page.unwrap_or(0),
            selected: params.selected,
            notice: params.notice,
        }
    }

    pub fn to_params(&self) -> ListParams {
        ListParams {
            q: self.filter.keyword.clone(),
            skills: join_list(&self.filter.skills),
            min_price: self.filter.min_price,
            max_price: self.filter.max_price,
            location: self.filter.location.clone(),
            remote: self.filter.remote_type,
            sources: join_list(&self.filter.sources),
            sort: (self.sort != Sort::default()).then_some(self.sort),
            page: (self.page > 0).then_some(self.page),
            selected: self.selected,
            notice: self.notice,
        }
    }

    /// Next state after `event`. A notice is shown once and dropped by any
    /// transition.
    pub fn apply(&self, event: ListEvent) -> ListState {
        let mut next = ListState {
            notice: None,
            ..self.clone()
        };
        match event {
            ListEvent::SubmitFilter(filter) => {
                next.filter = filter;
                next.page = 0;
            }
            ListEvent::ResetFilter => {
                next.filter = SearchFilter::default();
                next.page = 0;
            }
            ListEvent::ChangePage(page) => next.page = page,
            ListEvent::ChangeSort(sort) => {
                next.sort = sort;
                next.page = 0;
            }
            ListEvent::SelectJob(id) => next.selected = Some(id),
            ListEvent::CloseDetail => next.selected = None,
        }
        next
    }

    pub fn href(&self) -> String {
        page_url("/", &encode_query(&self.to_params()))
    }

    /// URL of the state reached by `event`; page changes land at the top
    pub fn link(&self, event: ListEvent) -> String {
        let scroll = matches!(event, ListEvent::ChangePage(_));
        let href = self.apply(event).href();
        if scroll {
            format!("{}#top", href)
        } else {
            href
        }
    }

    /// State without the one-shot notice, used as a mutation's return path
    pub fn return_to(&self) -> String {
        ListState {
            notice: None,
            ..self.clone()
        }
        .href()
    }

    /// The cache query backing the current page of results
    pub fn query(&self, size: u32) -> JobQuery {
        if self.filter.is_unconstrained() {
            JobQuery::List {
                page: self.page,
                size,
                sort: self.sort,
            }
        } else {
            JobQuery::Search(self.filter.to_request(self.sort, self.page, size))
        }
    }
}

pub struct ListView {
    pub state: ListState,
    pub jobs: QueryState<PageResponse<JobSummary>>,
    pub detail: Option<DetailView>,
}

/// Run the queries the list page needs. The detail goes first so a job
/// marked read shows up as read in the results.
pub async fn load(app: &AppState, state: ListState) -> ListView {
    let detail = match state.selected {
        Some(id) => Some(load_detail(app, id).await),
        None => None,
    };

    let query = state.query(app.page_size);
    app.views.show(LIST_PAGE, &app.queries, &query);

    let jobs = match &query {
        JobQuery::Search(request) => {
            settle_page(app.render_timeout, app.queries.search(request)).await
        }
        _ => {
            settle_page(
                app.render_timeout,
                app.queries.jobs(state.page, app.page_size, state.sort),
            )
            .await
        }
    };

    ListView {
        state,
        jobs,
        detail,
    }
}

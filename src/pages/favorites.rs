use serde::{Deserialize, Serialize};
use validator::Validate;

use super::detail::{load_detail, DetailView};
use super::{encode_query, page_url, settle_page, Notice, QueryState};
use crate::query::JobQuery;
use crate::remote::{JobSummary, PageResponse};
use crate::state::AppState;

pub const FAVORITES_PAGE: &str = "favorites";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct FavoritesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 100000, message = "Page is out of range"))]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FavoritesEvent {
    ChangePage(u32),
    SelectJob(i64),
    CloseDetail,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesState {
    pub page: u32,
    pub selected: Option<i64>,
    pub notice: Option<Notice>,
}

impl FavoritesState {
    pub fn from_params(params: FavoritesParams) -> Self {
        FavoritesState {
            page: params.page.unwrap_or(0),
            selected: params.selected,
            notice: params.notice,
        }
    }

    pub fn to_params(&self) -> FavoritesParams {
        FavoritesParams {
            page: (self.page > 0).then_some(self.page),
            selected: self.selected,
            notice: self.notice,
        }
    }

    pub fn apply(&self, event: FavoritesEvent) -> FavoritesState {
        let mut next = FavoritesState {
            notice: None,
            ..self.clone()
        };
        match event {
            FavoritesEvent::ChangePage(page) => next.page = page,
            FavoritesEvent::SelectJob(id) => next.selected = Some(id),
            FavoritesEvent::CloseDetail => next.selected = None,
        }
        next
    }

    pub fn href(&self) -> String {
        page_url("/favorites", &encode_query(&self.to_params()))
    }

    pub fn link(&self, event: FavoritesEvent) -> String {
        let href = self.apply(event).href();
        match event {
            FavoritesEvent::ChangePage(_) => format!("{}#top", href),
            _ => href,
        }
    }

    pub fn return_to(&self) -> String {
        FavoritesState {
            notice: None,
            ..self.clone()
        }
        .href()
    }
}

pub struct FavoritesView {
    pub state: FavoritesState,
    pub jobs: QueryState<PageResponse<JobSummary>>,
    pub detail: Option<DetailView>,
}

pub async fn load(app: &AppState, state: FavoritesState) -> FavoritesView {
    let detail = match state.selected {
        Some(id) => Some(load_detail(app, id).await),
        None => None,
    };

    let query = JobQuery::Favorites {
        page: state.page,
        size: app.page_size,
    };
    app.views.show(FAVORITES_PAGE, &app.queries, &query);
    let jobs = settle_page(
        app.render_timeout,
        app.queries.favorites(state.page, app.page_size),
    )
    .await;

    FavoritesView {
        state,
        jobs,
        detail,
    }
}

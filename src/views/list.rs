use std::fmt::Write;

use super::job_card::job_card;
use super::job_detail::job_detail;
use super::labels::count;
use super::pagination::pagination;
use super::search_filter::search_filter;
use super::{banner, escape, layout, query_state, Nav};
use crate::pages::{
    Banner, FavoritesEvent, FavoritesView, ListEvent, ListState, ListView, QueryState,
};
use crate::remote::models::{SortKey, SortOrder};
use crate::remote::{JobSummary, PageResponse, Sort};

fn sort_label(sort: Sort) -> &'static str {
    match (sort.key, sort.order) {
        (SortKey::CrawledAt, SortOrder::Desc) => "Crawled (newest)",
        (SortKey::CrawledAt, SortOrder::Asc) => "Crawled (oldest)",
        (SortKey::MaxPrice, SortOrder::Desc) => "Rate (highest)",
        (SortKey::MaxPrice, SortOrder::Asc) => "Rate (lowest)",
        (SortKey::PostedAt, SortOrder::Desc) => "Posted (newest)",
        (SortKey::PostedAt, SortOrder::Asc) => "Posted (oldest)",
    }
}

fn sort_control(state: &ListState) -> String {
    let mut html = String::from(r#"<div class="sort-control"><span class="sort-label">Sort:</span>"#);
    for sort in Sort::CHOICES {
        if sort == state.sort {
            let _ = write!(
                html,
                r#"<span class="sort-option active">{}</span>"#,
                sort_label(sort)
            );
        } else {
            let _ = write!(
                html,
                r#"<a class="sort-option" href="{}">{}</a>"#,
                escape(&state.link(ListEvent::ChangeSort(sort))),
                sort_label(sort)
            );
        }
    }
    html.push_str("</div>");
    html
}

fn job_count(jobs: &QueryState<PageResponse<JobSummary>>) -> String {
    match jobs {
        QueryState::Ready(page) => format!(
            r#"<span class="job-count">{} jobs</span>"#,
            count(page.total_elements)
        ),
        QueryState::Empty => r#"<span class="job-count">0 jobs</span>"#.to_string(),
        _ => String::new(),
    }
}

fn job_grid(
    page: &PageResponse<JobSummary>,
    selected: Option<i64>,
    open_href: impl Fn(i64) -> String,
    return_to: &str,
) -> String {
    let mut html = String::from(r#"<div class="job-grid">"#);
    for job in &page.content {
        html.push_str(&job_card(
            job,
            &open_href(job.id),
            return_to,
            selected == Some(job.id),
        ));
    }
    html.push_str("</div>");
    html
}

fn is_loading(jobs: &QueryState<PageResponse<JobSummary>>, detail_loading: bool) -> bool {
    jobs.is_loading() || detail_loading
}

pub fn list_page(view: &ListView) -> String {
    let state = &view.state;
    let return_to = state.return_to();
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<div class="page-header"><h1 class="page-title">Jobs</h1>{}</div>"#,
        job_count(&view.jobs)
    );
    if let Some(notice) = state.notice {
        body.push_str(&banner(&Banner::from(notice)));
    }
    body.push_str(&search_filter(state));
    let _ = write!(body, r#"<div class="list-header">{}</div>"#, sort_control(state));

    body.push_str(&query_state(
        &view.jobs,
        "Failed to load jobs.",
        ("No jobs found.", "Try different search criteria."),
        |page| {
            let mut html = job_grid(
                page,
                state.selected,
                |id| state.link(ListEvent::SelectJob(id)),
                &return_to,
            );
            html.push_str(&pagination(page.number, page.total_pages, |p| {
                state.link(ListEvent::ChangePage(p))
            }));
            html
        },
    ));

    if let Some(detail) = &view.detail {
        body.push_str(&job_detail(
            detail,
            &state.link(ListEvent::CloseDetail),
            &return_to,
        ));
    }

    let detail_loading = view.detail.as_ref().is_some_and(|d| d.job.is_loading());
    layout("Jobs", Nav::Jobs, &body, is_loading(&view.jobs, detail_loading))
}

pub fn favorites_page(view: &FavoritesView) -> String {
    let state = &view.state;
    let return_to = state.return_to();
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<div class="page-header"><h1 class="page-title">Favorites</h1>{}</div>"#,
        job_count(&view.jobs)
    );
    if let Some(notice) = state.notice {
        body.push_str(&banner(&Banner::from(notice)));
    }

    body.push_str(&query_state(
        &view.jobs,
        "Failed to load favorites.",
        (
            "No favorites yet.",
            "Star a job on the job list to keep it here.",
        ),
        |page| {
            let mut html = job_grid(
                page,
                state.selected,
                |id| state.link(FavoritesEvent::SelectJob(id)),
                &return_to,
            );
            html.push_str(&pagination(page.number, page.total_pages, |p| {
                state.link(FavoritesEvent::ChangePage(p))
            }));
            html
        },
    ));

    if let Some(detail) = &view.detail {
        body.push_str(&job_detail(
            detail,
            &state.link(FavoritesEvent::CloseDetail),
            &return_to,
        ));
    }

    let detail_loading = view.detail.as_ref().is_some_and(|d| d.job.is_loading());
    layout(
        "Favorites",
        Nav::Favorites,
        &body,
        is_loading(&view.jobs, detail_loading),
    )
}

//! HTML rendering. Every function here is pure: state in, markup out.

pub mod job_card;
pub mod job_detail;
pub mod labels;
pub mod list;
pub mod pagination;
pub mod search_filter;
pub mod settings;
pub mod stats;

use std::fmt::Write;

use crate::pages::{Banner, QueryState};
use crate::query::QueryError;

/// Seconds before a page still waiting on the backend reloads itself
pub const LOADING_REFRESH_SECS: u32 = 2;

/// Escape text for use in HTML content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Jobs,
    Favorites,
    Stats,
    Settings,
}

impl Nav {
    const ALL: [Nav; 4] = [Nav::Jobs, Nav::Favorites, Nav::Stats, Nav::Settings];

    fn path(&self) -> &'static str {
        match self {
            Nav::Jobs => "/",
            Nav::Favorites => "/favorites",
            Nav::Stats => "/stats",
            Nav::Settings => "/settings",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Nav::Jobs => "Jobs",
            Nav::Favorites => "Favorites",
            Nav::Stats => "Stats",
            Nav::Settings => "Settings",
        }
    }
}

fn header(active: Option<Nav>) -> String {
    let mut links = String::new();
    for nav in Nav::ALL {
        let class = if Some(nav) == active {
            "nav-link active"
        } else {
            "nav-link"
        };
        let _ = write!(
            links,
            r#"<a class="{}" href="{}">{}</a>"#,
            class,
            nav.path(),
            nav.label()
        );
    }
    format!(
        r#"<header class="header"><a class="header-logo" href="/">Job Dashboard</a><nav class="header-nav">{}</nav></header>"#,
        links
    )
}

/// Full page with header navigation. `refresh` reloads the page while a
/// query is still loading.
pub fn layout(title: &str, active: Nav, body: &str, refresh: bool) -> String {
    page(title, Some(active), body, refresh)
}

/// Error page for requests that never reach a page container
pub fn error_page(title: &str, messages: &[String]) -> String {
    let mut body = format!(r#"<div class="error-state card"><h1>{}</h1>"#, escape(title));
    if !messages.is_empty() {
        body.push_str("<ul>");
        for message in messages {
            let _ = write!(body, "<li>{}</li>", escape(message));
        }
        body.push_str("</ul>");
    }
    body.push_str(r#"<p><a href="/">Back to the job list</a></p></div>"#);
    page(title, None, &body, false)
}

fn page(title: &str, active: Option<Nav>, body: &str, refresh: bool) -> String {
    let refresh = if refresh {
        format!(
            r#"<meta http-equiv="refresh" content="{}">"#,
            LOADING_REFRESH_SECS
        )
    } else {
        String::new()
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}<title>{title} | Job Dashboard</title>
</head>
<body id="top">
{header}
<main class="page container">
{body}
</main>
</body>
</html>
"#,
        refresh = refresh,
        title = escape(title),
        header = header(active),
        body = body,
    )
}

pub fn banner(banner: &Banner) -> String {
    let class = if banner.success {
        "alert alert-success"
    } else {
        "alert alert-error"
    };
    format!(
        r#"<div class="{}" role="status">{}</div>"#,
        class,
        escape(&banner.message)
    )
}

pub fn loading() -> String {
    r#"<div class="loading-container"><div class="spinner"></div><p class="text-muted">Loading...</p></div>"#
        .to_string()
}

pub fn error(message: &str, err: &QueryError) -> String {
    let status = match err.api_error().and_then(|e| e.status()) {
        Some(status) => format!(
            r#"<p class="text-muted text-xs">Backend responded with status {}</p>"#,
            status
        ),
        None => String::new(),
    };
    format!(
        r#"<div class="error-state card"><p>{}</p><p class="text-muted text-sm">Check that the API server is running.</p>{}</div>"#,
        escape(message),
        status
    )
}

pub fn empty(message: &str, hint: &str) -> String {
    format!(
        r#"<div class="empty-state"><p>{}</p><p class="text-muted text-sm">{}</p></div>"#,
        escape(message),
        escape(hint)
    )
}

/// Render the four query states, with `ready` for loaded data
pub fn query_state<T>(
    state: &QueryState<T>,
    error_message: &str,
    (empty_message, empty_hint): (&str, &str),
    ready: impl FnOnce(&T) -> String,
) -> String {
    match state {
        QueryState::Loading => loading(),
        QueryState::Error(err) => error(error_message, err),
        QueryState::Empty => empty(empty_message, empty_hint),
        QueryState::Ready(value) => ready(value),
    }
}

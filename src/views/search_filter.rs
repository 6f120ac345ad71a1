use std::fmt::Write;

use super::escape;
use super::labels::remote_label;
use crate::pages::{ListEvent, ListState};
use crate::remote::{RemoteType, Sort};

fn text_input(name: &str, value: Option<&str>, placeholder: &str) -> String {
    format!(
        r#"<input type="text" class="input" name="{}" value="{}" placeholder="{}">"#,
        name,
        escape(value.unwrap_or_default()),
        escape(placeholder)
    )
}

fn number_input(name: &str, value: Option<i32>, placeholder: &str) -> String {
    format!(
        r#"<input type="number" min="0" class="input" name="{}" value="{}" placeholder="{}">"#,
        name,
        value.map(|v| v.to_string()).unwrap_or_default(),
        placeholder
    )
}

/// Search form. Submitting starts from page one with the current sort; the
/// advanced panel stays open while any advanced criterion is set.
pub fn search_filter(state: &ListState) -> String {
    let filter = &state.filter;
    let mut html = String::from(r#"<div class="search-filter card-glass"><form method="get" action="/">"#);

    if state.sort != Sort::default() {
        let _ = write!(
            html,
            r#"<input type="hidden" name="sort" value="{}">"#,
            state.sort
        );
    }

    let _ = write!(
        html,
        r#"<div class="search-main"><input type="text" class="input search-input" name="q" value="{}" placeholder="Keyword (skill, title...)"><button type="submit" class="btn btn-primary">Search</button></div>"#,
        escape(filter.keyword.as_deref().unwrap_or_default())
    );

    let _ = write!(
        html,
        r#"<details class="search-details"{}><summary>More filters</summary>"#,
        if filter.has_advanced() { " open" } else { "" }
    );

    html.push_str(r#"<div class="filter-row">"#);
    let _ = write!(
        html,
        r#"<div class="filter-group"><label class="filter-label">Rate (万円)</label><div class="price-range">{}<span class="price-separator">〜</span>{}</div></div>"#,
        number_input("min_price", filter.min_price, "Min"),
        number_input("max_price", filter.max_price, "Max")
    );
    let _ = write!(
        html,
        r#"<div class="filter-group"><label class="filter-label">Location</label>{}</div>"#,
        text_input("location", filter.location.as_deref(), "e.g. Tokyo")
    );

    let mut options = String::from(r#"<option value="">Any</option>"#);
    for remote in RemoteType::ALL {
        let _ = write!(
            options,
            r#"<option value="{}"{}>{}</option>"#,
            remote.as_str(),
            if filter.remote_type == Some(remote) { " selected" } else { "" },
            remote_label(remote)
        );
    }
    let _ = write!(
        html,
        r#"<div class="filter-group"><label class="filter-label">Remote</label><select class="input select" name="remote">{}</select></div>"#,
        options
    );
    html.push_str("</div>");

    html.push_str(r#"<div class="filter-row">"#);
    let _ = write!(
        html,
        r#"<div class="filter-group"><label class="filter-label">Skills</label>{}</div>"#,
        text_input("skills", Some(&filter.skills.join(", ")), "e.g. Java, AWS")
    );
    let _ = write!(
        html,
        r#"<div class="filter-group"><label class="filter-label">Sources</label>{}</div>"#,
        text_input("sources", Some(&filter.sources.join(", ")), "e.g. SESBoard")
    );
    html.push_str("</div>");

    let _ = write!(
        html,
        r#"<div class="filter-actions"><a class="btn btn-ghost" href="{}">Reset</a></div>"#,
        escape(&state.link(ListEvent::ResetFilter))
    );
    html.push_str("</details></form></div>");
    html
}

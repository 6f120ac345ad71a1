use std::fmt::Write;

use super::escape;
use super::labels::{card_price, date, remote_label, source_label};
use crate::remote::{JobStatus, JobSummary};

const MAX_CARD_SKILLS: usize = 5;

/// Skill tags for a card: the first five, then a "+N" tag for the rest
pub fn skill_tags(skills: &[String]) -> String {
    let mut html = String::new();
    for skill in skills.iter().take(MAX_CARD_SKILLS) {
        let _ = write!(html, r#"<span class="tag tag-skill">{}</span>"#, escape(skill));
    }
    if skills.len() > MAX_CARD_SKILLS {
        let _ = write!(
            html,
            r#"<span class="tag">+{}</span>"#,
            skills.len() - MAX_CARD_SKILLS
        );
    }
    html
}

/// Favorite toggle button; posts back to `return_to` after the toggle
pub fn favorite_form(id: i64, is_favorite: bool, return_to: &str) -> String {
    let (symbol, label) = if is_favorite {
        ("&#9733;", "Remove from favorites")
    } else {
        ("&#9734;", "Add to favorites")
    };
    format!(
        r#"<form class="favorite-form" method="post" action="/jobs/{id}/favorite"><input type="hidden" name="return_to" value="{return_to}"><button type="submit" class="favorite-btn{active}" aria-label="{label}">{symbol}</button></form>"#,
        id = id,
        return_to = escape(return_to),
        active = if is_favorite { " active" } else { "" },
        label = label,
        symbol = symbol,
    )
}

pub fn job_card(job: &JobSummary, open_href: &str, return_to: &str, selected: bool) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<article class="job-card{}" id="job-{}">"#,
        if selected { " selected" } else { "" },
        job.id
    );

    html.push_str(r#"<div class="job-card-header"><div class="job-source">"#);
    let _ = write!(
        html,
        r#"<span class="tag">{}</span>"#,
        escape(source_label(&job.source))
    );
    if job.status == JobStatus::New {
        html.push_str(r#"<span class="tag tag-new">New</span>"#);
    }
    html.push_str("</div>");
    html.push_str(&favorite_form(job.id, job.is_favorite, return_to));
    html.push_str("</div>");

    let _ = write!(
        html,
        r#"<h3 class="job-title"><a href="{}">{}</a></h3>"#,
        escape(open_href),
        escape(&job.title)
    );

    let _ = write!(
        html,
        r#"<div class="job-info"><div class="job-price"><span class="price-label">Rate</span> <span class="price-value">{}</span></div>"#,
        card_price(job.max_price)
    );
    if let Some(location) = &job.location {
        let _ = write!(html, r#"<div class="job-location">{}</div>"#, escape(location));
    }
    if let Some(remote) = job.remote_type {
        let _ = write!(
            html,
            r#"<span class="tag tag-remote-{}">{}</span>"#,
            remote.as_str().to_ascii_lowercase(),
            remote_label(remote)
        );
    }
    html.push_str("</div>");

    if !job.required_skills.is_empty() {
        let _ = write!(
            html,
            r#"<div class="job-skills">{}</div>"#,
            skill_tags(&job.required_skills)
        );
    }

    if let Some(posted_at) = job.posted_at {
        let _ = write!(
            html,
            r#"<div class="job-card-footer"><span class="job-date text-muted text-sm">{}</span></div>"#,
            date(posted_at)
        );
    }

    html.push_str("</article>");
    html
}

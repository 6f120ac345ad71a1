use std::fmt::Write;

use super::job_card::favorite_form;
use super::labels::{date_time, price_range, remote_label, source_label, status_label};
use super::{banner, escape, query_state};
use crate::pages::{Banner, DetailView};
use crate::remote::{Job, JobStatus};

fn field(label: &str, value: Option<&str>) -> String {
    format!(
        r#"<div class="detail-card"><span class="detail-label">{}</span><span class="detail-value">{}</span></div>"#,
        label,
        escape(value.unwrap_or("-"))
    )
}

fn status_form(job: &Job, return_to: &str) -> String {
    let mut options = String::new();
    for status in JobStatus::ALL {
        let _ = write!(
            options,
            r#"<option value="{}"{}>{}</option>"#,
            status.as_str(),
            if status == job.status { " selected" } else { "" },
            status_label(status)
        );
    }
    format!(
        r#"<form class="status-form" method="post" action="/jobs/{}/status"><input type="hidden" name="return_to" value="{}"><select class="input select" name="status">{}</select><button type="submit" class="btn btn-secondary">Update</button></form>"#,
        job.id,
        escape(return_to),
        options
    )
}

fn skill_block(label: &str, skills: &[String], class: &str) -> String {
    if skills.is_empty() {
        return String::new();
    }
    let mut tags = String::new();
    for skill in skills {
        let _ = write!(tags, r#"<span class="{}">{}</span>"#, class, escape(skill));
    }
    format!(
        r#"<div class="skill-block"><span class="skill-label">{}</span><div class="skill-tags">{}</div></div>"#,
        label, tags
    )
}

fn job_body(job: &Job, close_href: &str, return_to: &str) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<div class="modal-header"><div class="modal-title-area"><span class="tag">{}</span><span class="tag tag-status-{}">{}</span></div><div class="modal-actions">{}<a class="btn btn-icon" href="{}" aria-label="Close">&#10005;</a></div></div>"#,
        escape(source_label(&job.source)),
        job.status.as_str().to_ascii_lowercase(),
        status_label(job.status),
        favorite_form(job.id, job.is_favorite, return_to),
        escape(close_href)
    );
    let _ = write!(html, r#"<h2 class="modal-title">{}</h2>"#, escape(&job.title));

    html.push_str(r#"<div class="detail-grid">"#);
    let _ = write!(
        html,
        r#"<div class="detail-card detail-price"><span class="detail-label">Monthly rate</span><span class="detail-value price-value">{}</span>"#,
        price_range(job.min_price, job.max_price)
    );
    if let Some(hours) = &job.settlement_hours {
        let _ = write!(html, r#"<span class="detail-sub">Settlement: {}</span>"#, escape(hours));
    }
    html.push_str("</div>");
    html.push_str(&field("Location", job.location.as_deref()));
    html.push_str(&field("Remote", job.remote_type.map(remote_label)));
    html.push_str(&field("Work days", job.work_days.as_deref()));
    html.push_str(&field("Experience", job.experience_years.as_deref()));
    html.push_str(&field("Start", job.start_date.as_deref()));
    html.push_str(&field("Contract", job.contract_period.as_deref()));
    html.push_str(&field("Company", job.company_name.as_deref()));
    html.push_str(&field("Industry", job.industry.as_deref()));
    html.push_str("</div>");

    if !job.required_skills.is_empty() || !job.preferred_skills.is_empty() {
        let _ = write!(
            html,
            r#"<div class="detail-section"><h3 class="section-title">Skills</h3>{}{}</div>"#,
            skill_block("Required", &job.required_skills, "tag tag-skill"),
            skill_block("Preferred", &job.preferred_skills, "tag")
        );
    }

    if let Some(description) = &job.description {
        let _ = write!(
            html,
            r#"<div class="detail-section"><h3 class="section-title">Description</h3><p class="detail-description">{}</p></div>"#,
            escape(description)
        );
    }

    html.push_str(&status_form(job, return_to));

    let _ = write!(
        html,
        r#"<div class="modal-footer">{}<div class="detail-meta text-sm text-muted">Crawled: {}</div></div>"#,
        source_link(&job.source_url),
        date_time(job.crawled_at)
    );
    html
}

/// Outbound link to the listing; only web URLs become links
fn source_link(url: &str) -> String {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="btn btn-primary">View on source site &rarr;</a>"#,
            escape(url.trim_start())
        )
    } else {
        String::new()
    }
}

/// Detail panel for the selected job
pub fn job_detail(detail: &DetailView, close_href: &str, return_to: &str) -> String {
    let notice = detail
        .notice
        .map(|n| banner(&Banner::from(n)))
        .unwrap_or_default();
    let body = query_state(
        &detail.job,
        "Failed to load this job.",
        ("This job could not be found.", ""),
        |job| job_body(job, close_href, return_to),
    );
    format!(
        r#"<aside class="job-detail" id="detail">{}{}</aside>"#,
        notice, body
    )
}

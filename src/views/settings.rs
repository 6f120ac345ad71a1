use std::fmt::Write;

use super::{banner, error, escape, layout, loading, Nav};
use crate::pages::{QueryState, SettingsDraft, SettingsView};
use crate::remote::models::NOTIFY_INTERVALS;
use crate::remote::NotificationChannel;

fn toggle(name: &str, checked: bool) -> String {
    format!(
        r#"<label class="toggle"><input type="checkbox" name="{}"{}><span class="toggle-slider"></span></label>"#,
        name,
        if checked { " checked" } else { "" }
    )
}

fn test_button(channel: NotificationChannel) -> String {
    format!(
        r#"<button type="submit" class="btn btn-secondary mt-md" formaction="/settings/test/{}">Send test</button>"#,
        channel.as_str()
    )
}

fn channel_card(
    title: &str,
    name: &str,
    enabled: bool,
    input: String,
    channel: NotificationChannel,
) -> String {
    format!(
        r#"<div class="settings-card card"><div class="settings-card-header"><h3>{}</h3>{}</div><div class="settings-card-body">{}{}</div></div>"#,
        title,
        toggle(name, enabled),
        input,
        test_button(channel)
    )
}

fn interval_select(current: &str) -> String {
    let mut options = String::new();
    for hours in NOTIFY_INTERVALS {
        let value = hours.to_string();
        let _ = write!(
            options,
            r#"<option value="{}"{}>Every {} hour{}</option>"#,
            value,
            if value == current.trim() { " selected" } else { "" },
            hours,
            if hours == 1 { "" } else { "s" }
        );
    }
    format!(
        r#"<select class="input select" name="notify_interval_hours">{}</select>"#,
        options
    )
}

fn settings_form(draft: &SettingsDraft) -> String {
    let mut html = String::from(r#"<form method="post" action="/settings" class="settings-grid">"#);

    html.push_str(&channel_card(
        "Email",
        "email_enabled",
        draft.email_enabled,
        format!(
            r#"<label class="input-label">Email address</label><input type="email" class="input" name="email_address" value="{}" placeholder="example@email.com">"#,
            escape(&draft.email_address)
        ),
        NotificationChannel::Email,
    ));
    html.push_str(&channel_card(
        "LINE",
        "line_enabled",
        draft.line_enabled,
        r#"<label class="input-label">LINE Notify token</label><input type="password" class="input" name="line_token" value="" placeholder="Leave blank to keep the saved token" autocomplete="off">"#
            .to_string(),
        NotificationChannel::Line,
    ));
    html.push_str(&channel_card(
        "Slack",
        "slack_enabled",
        draft.slack_enabled,
        r#"<label class="input-label">Webhook URL</label><input type="password" class="input" name="slack_webhook_url" value="" placeholder="Leave blank to keep the saved webhook" autocomplete="off">"#
            .to_string(),
        NotificationChannel::Slack,
    ));

    let _ = write!(
        html,
        r#"<div class="settings-card card"><div class="settings-card-header"><h3>Filters</h3></div><div class="settings-card-body"><label class="input-label">Minimum rate (万円)</label><input type="number" min="0" class="input" name="min_price_threshold" value="{}"><label class="input-label">Skills</label><input type="text" class="input" name="skills_filter" value="{}" placeholder="e.g. Java, AWS"><label class="checkbox-label"><input type="checkbox" name="remote_only"{}> Remote only</label><label class="input-label">Interval</label>{}</div></div>"#,
        escape(&draft.min_price_threshold),
        escape(&draft.skills_filter),
        if draft.remote_only { " checked" } else { "" },
        interval_select(&draft.notify_interval_hours)
    );

    html.push_str(r#"<div class="settings-actions"><button type="submit" class="btn btn-primary btn-lg">Save settings</button></div>"#);
    html.push_str("</form>");
    html
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<ul class="form-errors">"#);
    for message in errors {
        let _ = write!(html, "<li>{}</li>", escape(message));
    }
    html.push_str("</ul>");
    html
}

pub fn settings_page(view: &SettingsView) -> String {
    let mut body = String::from(
        r#"<div class="page-header"><h1 class="page-title">Notification settings</h1></div>"#,
    );
    if let Some(b) = &view.banner {
        body.push_str(&banner(b));
    }
    body.push_str(&error_list(&view.errors));

    // A failed save keeps the typed draft even if the reload failed.
    match &view.settings {
        QueryState::Loading if view.errors.is_empty() && view.banner.is_none() => {
            body.push_str(&loading())
        }
        QueryState::Error(err) if view.banner.is_none() => {
            body.push_str(&error("Failed to load notification settings.", err))
        }
        _ => body.push_str(&settings_form(&view.draft)),
    }

    let refresh = view.settings.is_loading() && view.banner.is_none();
    layout("Settings", Nav::Settings, &body, refresh)
}

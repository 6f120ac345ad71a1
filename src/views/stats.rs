use std::fmt::Write;

use super::labels::{average_price, count, source_label};
use super::{escape, layout, query_state, Nav};
use crate::pages::stats::source_bars;
use crate::pages::StatsView;
use crate::remote::StatsOverview;

fn stat_card(class: &str, value: &str, label: &str) -> String {
    format!(
        r#"<div class="stat-card {}"><span class="stat-value">{}</span><span class="stat-label">{}</span></div>"#,
        class, value, label
    )
}

fn overview(stats: &StatsOverview) -> String {
    let mut html = String::from(r#"<div class="stats-grid">"#);
    html.push_str(&stat_card("stat-total", &count(stats.total_jobs), "Total jobs"));
    html.push_str(&stat_card("stat-new", &count(stats.new_jobs), "New jobs"));
    html.push_str(&stat_card(
        "stat-favorite",
        &count(stats.favorite_jobs),
        "Favorites",
    ));
    html.push_str(&stat_card(
        "stat-price",
        &average_price(stats.average_price),
        "Average rate",
    ));
    html.push_str("</div>");

    let bars = source_bars(stats);
    if !bars.is_empty() {
        html.push_str(r#"<div class="source-section card"><h2 class="section-title">Jobs by source</h2><div class="source-bars">"#);
        for bar in bars {
            let _ = write!(
                html,
                r#"<div class="source-bar-item"><div class="source-bar-header"><span class="source-name">{}</span><span class="source-count">{}</span></div><div class="source-bar-track"><div class="source-bar-fill" style="width: {:.1}%"></div></div></div>"#,
                escape(source_label(&bar.source)),
                count(bar.count),
                bar.percent
            );
        }
        html.push_str("</div></div>");
    }
    html
}

pub fn stats_page(view: &StatsView) -> String {
    let mut body = String::from(
        r#"<div class="page-header"><h1 class="page-title">Statistics</h1></div>"#,
    );
    body.push_str(&query_state(
        &view.stats,
        "Failed to load statistics.",
        ("No statistics yet.", ""),
        overview,
    ));
    layout("Statistics", Nav::Stats, &body, view.stats.is_loading())
}

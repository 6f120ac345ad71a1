use std::fmt::Write;

use super::escape;

const MAX_VISIBLE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    /// Zero-based page index
    Page(u32),
    Ellipsis,
}

/// Page buttons for `current` of `total`: all of them when there are few,
/// otherwise first, last and the neighbours of the current page.
pub fn page_window(current: u32, total: u32) -> Vec<PageItem> {
    if total <= MAX_VISIBLE {
        return (0..total).map(PageItem::Page).collect();
    }

    let mut items = vec![PageItem::Page(0)];
    if current > 2 {
        items.push(PageItem::Ellipsis);
    }

    let start = current.saturating_sub(1).max(1);
    let end = (current + 1).min(total - 2);
    items.extend((start..=end).map(PageItem::Page));

    if current + 3 < total {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total - 1));
    items
}

/// Pagination bar. Renders nothing for a single page.
pub fn pagination(current: u32, total: u32, href: impl Fn(u32) -> String) -> String {
    if total <= 1 {
        return String::new();
    }

    let mut html = String::from(r#"<nav class="pagination">"#);

    if current == 0 {
        html.push_str(r#"<span class="pagination-btn disabled">&larr; Prev</span>"#);
    } else {
        let _ = write!(
            html,
            r#"<a class="pagination-btn" href="{}">&larr; Prev</a>"#,
            escape(&href(current - 1))
        );
    }

    html.push_str(r#"<div class="pagination-pages">"#);
    for item in page_window(current, total) {
        match item {
            PageItem::Page(page) if page == current => {
                let _ = write!(
                    html,
                    r#"<span class="pagination-page active">{}</span>"#,
                    page + 1
                );
            }
            PageItem::Page(page) => {
                let _ = write!(
                    html,
                    r#"<a class="pagination-page" href="{}">{}</a>"#,
                    escape(&href(page)),
                    page + 1
                );
            }
            PageItem::Ellipsis => html.push_str(r#"<span class="pagination-ellipsis">...</span>"#),
        }
    }
    html.push_str("</div>");

    if current + 1 >= total {
        html.push_str(r#"<span class="pagination-btn disabled">Next &rarr;</span>"#);
    } else {
        let _ = write!(
            html,
            r#"<a class="pagination-btn" href="{}">Next &rarr;</a>"#,
            escape(&href(current + 1))
        );
    }

    html.push_str("</nav>");
    html
}

use chrono::NaiveDateTime;

use crate::remote::{JobStatus, RemoteType};

pub fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::New => "New",
        JobStatus::Read => "Read",
        JobStatus::Applied => "Applied",
        JobStatus::Closed => "Closed",
    }
}

pub fn remote_label(remote: RemoteType) -> &'static str {
    match remote {
        RemoteType::Full => "Full remote",
        RemoteType::Partial => "Partly remote",
        RemoteType::Onsite => "On-site",
    }
}

pub fn source_label(source: &str) -> &str {
    match source {
        "TechDirect" => "Tech Direct",
        "FreelanceBoard" => "Freelance Board",
        other => other,
    }
}

/// Card price: the upper bound, or "-" when unknown
pub fn card_price(max_price: Option<i32>) -> String {
    match max_price {
        Some(price) if price != 0 => format!("{}万円", price),
        _ => "-".to_string(),
    }
}

/// Detail price range; a single figure when both ends agree
pub fn price_range(min_price: Option<i32>, max_price: Option<i32>) -> String {
    let min = min_price.filter(|p| *p != 0);
    let max = max_price.filter(|p| *p != 0);
    let show = |p: Option<i32>| p.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    match (min, max) {
        (None, None) => "-".to_string(),
        (min, max) if min == max => format!("{}万円", show(max)),
        (min, max) => format!("{}〜{}万円", show(min), show(max)),
    }
}

pub fn average_price(price: Option<f64>) -> String {
    match price {
        Some(price) if price > 0.0 => format!("{}万円", price.round() as i64),
        _ => "-".to_string(),
    }
}

pub fn date(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d").to_string()
}

pub fn date_time(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Thousands separators, e.g. 12,345
pub fn count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

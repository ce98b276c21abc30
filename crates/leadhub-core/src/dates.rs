//! Date helpers used for sorting and for the derived event fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses the date formats the backend emits.
///
/// Accepts plain `YYYY-MM-DD`, RFC 3339 timestamps and anything starting with
/// a `YYYY-MM-DD` prefix (Mongo's `2024-01-05T00:00:00.000Z`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Day of month (no padding) and three-letter month for an event date.
///
/// Returns `None` for unparseable input; callers clear the derived fields
/// in that case.
pub fn date_parts(raw: &str) -> Option<(String, String)> {
    let date = parse_date(raw)?;
    Some((date.format("%-d").to_string(), date.format("%b").to_string()))
}

/// Human-friendly age of a date ("3 days ago").
pub fn time_ago(raw: &str, now: DateTime<Utc>) -> Option<String> {
    let date = parse_date(raw)?;
    let then = date.and_hms_opt(0, 0, 0)?.and_utc();
    let elapsed = now.signed_duration_since(then);

    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    let text = if days <= 0 {
        if hours <= 0 {
            "Just now".to_string()
        } else {
            plural(hours, "hour")
        }
    } else if days < 30 {
        plural(days, "day")
    } else {
        let months = (days as f64 / 30.44).floor() as i64;
        if months < 12 {
            plural(months, "month")
        } else {
            plural((days as f64 / 365.25).floor() as i64, "year")
        }
    };
    Some(text)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

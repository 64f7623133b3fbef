use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive date-time layouts seen in provider payloads, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d-%m-%Y %H:%M"];

/// Naive date layouts, interpreted as midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parses an episode publish date.
///
/// Accepts RFC 3339, RFC 2822 and a handful of naive layouts; naive values
/// are taken as UTC. Returns `None` when nothing matches.
pub fn parse_publish_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

/// Formats a timestamp as used in RSS `pubDate`/`lastBuildDate`:
/// `Tue, 05 Mar 2024 09:30:00 GMT`.
pub fn format_rfc1123(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

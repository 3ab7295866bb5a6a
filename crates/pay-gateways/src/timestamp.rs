//! Lenient parsing of the timestamp formats gateways put in webhooks.

use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse RFC 3339 or a zone-less `YYYY-MM-DD HH:MM:SS` (read as UTC)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// First parseable timestamp among `candidates`, else now
pub fn timestamp_or_now(candidates: &[&str]) -> DateTime<Utc> {
    candidates
        .iter()
        .find_map(|c| parse_timestamp(c))
        .unwrap_or_else(Utc::now)
}

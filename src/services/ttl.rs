//! Lifetime of a posting, derived from the deadline the model extracted.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

const SECONDS_PER_HOUR: i64 = 3600;

const AWARE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A parsed deadline. Zone-less values are compared against local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryTimestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

pub fn parse_timestamp(text: &str) -> Option<ExpiryTimestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ExpiryTimestamp::Aware(dt));
    }
    if let Some(dt) = AWARE_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    {
        return Some(ExpiryTimestamp::Aware(dt));
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(ExpiryTimestamp::Naive(dt));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(ExpiryTimestamp::Naive)
}

/// Whole hours left until `expiry_text`, measured from the current time.
pub fn compute_ttl_hours(expiry_text: Option<&str>) -> Option<i32> {
    compute_ttl_hours_at(expiry_text, Utc::now())
}

/// Whole hours between `now` and the parsed deadline, floored and clamped at zero.
/// Absent or unparseable input yields `None`.
pub fn compute_ttl_hours_at(expiry_text: Option<&str>, now: DateTime<Utc>) -> Option<i32> {
    let remaining = match parse_timestamp(expiry_text?)? {
        ExpiryTimestamp::Aware(expiry) => expiry.with_timezone(&Utc) - now,
        ExpiryTimestamp::Naive(expiry) => expiry - now.with_timezone(&Local).naive_local(),
    };

    if remaining <= Duration::zero() {
        return Some(0);
    }

    let hours = remaining.num_seconds().div_euclid(SECONDS_PER_HOUR).max(0);
    Some(i32::try_from(hours).unwrap_or(i32::MAX))
}

pub fn derive_expires_at(
    posted_at: Option<DateTime<Utc>>,
    ttl_hours: Option<i32>,
) -> Option<DateTime<Utc>> {
    let posted_at = posted_at?;
    let ttl_hours = ttl_hours?;
    posted_at.checked_add_signed(Duration::hours(i64::from(ttl_hours)))
}

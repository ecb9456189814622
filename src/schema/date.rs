//! Date coercion for `pubDate`/`updatedDate`.
//!
//! Frontmatter dates arrive as whatever the author typed. Accepted:
//!
//! | Input                         | Interpreted as             |
//! |-------------------------------|----------------------------|
//! | `2024-06-15T14:30:45Z`        | RFC 3339                   |
//! | `Sat, 15 Jun 2024 14:30:45 GMT` | RFC 2822                 |
//! | `2024-06-15T14:30:45`         | naive date-time, UTC       |
//! | `2024-06-15`                  | midnight UTC               |
//! | `Jun 15 2024`, `June 15, 2024`| midnight UTC               |
//! | `1718461845000` (integer)     | milliseconds since epoch   |

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_yaml::Value;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%B %d %Y", "%B %d, %Y"];

/// Coerce a frontmatter value to a UTC timestamp.
pub fn coerce(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse(s),
        Value::Number(n) => match n.as_i64() {
            Some(ms) => DateTime::from_timestamp_millis(ms),
            None => n
                .as_f64()
                .filter(|ms| ms.is_finite())
                .and_then(|ms| DateTime::from_timestamp_millis(ms.trunc() as i64)),
        },
        _ => None,
    }
}

/// Parse a date string in any of the accepted formats.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.and_utc());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

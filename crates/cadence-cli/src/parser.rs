use chrono::{DateTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Failed to parse date '{input}': {reason}")]
pub struct ParseDateError {
    input: String,
    reason: String,
}

/// Accepts RFC 3339 timestamps as well as English phrases such as
/// "tomorrow", "next friday 9am" or "2025-06-01".
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>, ParseDateError> {
    parse_date_relative_to(date_str, Utc::now())
}

pub fn parse_date_relative_to(
    date_str: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ParseDateError> {
    let trimmed = date_str.trim();
    if let Ok(exact) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(exact.with_timezone(&Utc));
    }
    parse_date_string(trimmed, now, Dialect::Us).map_err(|e| ParseDateError {
        input: date_str.to_string(),
        reason: e.to_string(),
    })
}

/// Parses an optional flag value.
pub fn parse_optional_date(date_str: Option<&str>) -> Result<Option<DateTime<Utc>>, ParseDateError> {
    date_str.map(parse_date).transpose()
}

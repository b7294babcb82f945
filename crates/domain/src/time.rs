//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ValidationError;

/// UTC timestamp used for due dates, `created_at`, log times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse an ISO-8601 due date.
///
/// Accepts full RFC 3339 timestamps (any offset, normalised to UTC) and bare
/// `YYYY-MM-DD` dates, which resolve to midnight UTC.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDueDate`] for anything else.
pub fn parse_due_date(value: &str) -> Result<Timestamp, ValidationError> {
    let trimmed = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.to_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidDueDate(value.to_string()))
}

//! Date boundary format shared with upstream providers (`YYYYMMDD`).

use super::provider::DataError;
use chrono::NaiveDate;

const COMPACT: &str = "%Y%m%d";
const ISO: &str = "%Y-%m-%d";

/// Format a date as an 8-digit `YYYYMMDD` string.
pub fn format_yyyymmdd(date: NaiveDate) -> String {
    date.format(COMPACT).to_string()
}

/// Parse an 8-digit `YYYYMMDD` string.
pub fn parse_yyyymmdd(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DataError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, COMPACT).map_err(|_| DataError::InvalidDate(s.to_string()))
}

/// Parse either `YYYYMMDD` or `YYYY-MM-DD`. Upstream payloads use both.
pub fn parse_flexible(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();
    if s.contains('-') {
        // Some payloads append a time ("2024-01-02 00:00:00")
        let date_part = s.split_whitespace().next().unwrap_or(s);
        NaiveDate::parse_from_str(date_part, ISO).map_err(|_| DataError::InvalidDate(s.to_string()))
    } else {
        parse_yyyymmdd(s)
    }
}

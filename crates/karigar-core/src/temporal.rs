//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines [`Timestamp`], a UTC-only timestamp at seconds precision.
//! Booking lifecycle records, ledger entries, and wallet transactions all
//! carry these; keeping every stored instant in one canonical form
//! (`YYYY-MM-DDTHH:MM:SSZ`) means audit rows from different components
//! compare and sort without normalization.
//!
//! Non-UTC offsets are rejected by the strict parser at construction —
//! there is no silent conversion. External data with an offset goes
//! through [`Timestamp::parse_lenient`].

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an ISO8601 string, rejecting non-UTC offsets.
/// - [`Timestamp::parse_lenient()`] — accepts any offset, converts to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string, UTC only.
    ///
    /// Only the `Z` suffix is accepted. Explicit offsets are rejected,
    /// including `+00:00` even though it names the same instant — stored
    /// timestamps must have exactly one textual form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::Validation(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            CoreError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    ///
    /// For ingesting gateway webhook payloads and other external data.
    pub fn parse_lenient(s: &str) -> Result<Self, CoreError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            CoreError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-08-26T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision.
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates_nanos() {
        let dt = Utc.with_ymd_and_hms(2026, 8, 26, 9, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(987_654_321).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-08-26T09:30:45Z");
    }

    #[test]
    fn strict_parse_accepts_z_only() {
        assert!(Timestamp::parse("2026-08-26T12:00:00Z").is_ok());
        assert!(Timestamp::parse("2026-08-26T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-08-26T17:00:00+05:00").is_err());
        assert!(Timestamp::parse("not-a-date").is_err());
    }

    #[test]
    fn lenient_parse_converts_offsets() {
        let ts = Timestamp::parse_lenient("2026-08-26T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-08-26T12:00:00Z");
    }

    #[test]
    fn ordering_follows_instants() {
        let a = Timestamp::parse("2026-08-26T12:00:00Z").unwrap();
        let b = Timestamp::parse("2026-08-26T12:00:01Z").unwrap();
        assert!(a < b);
    }

    #[test]
    fn display_matches_iso8601() {
        let ts = Timestamp::parse("2026-01-01T00:00:00Z").unwrap();
        assert_eq!(format!("{ts}"), "2026-01-01T00:00:00Z");
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::parse("2026-08-26T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}

//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp type truncated to microsecond
//! precision.
//!
//! ## Precision Invariant
//!
//! Every timestamp in the ledger is UTC with at most microsecond
//! resolution. Microseconds (not seconds) are the unit here because
//! transaction-log cursors are derived from record timestamps and rely on
//! sub-second resolution for uniqueness — the log clock allocates strictly
//! increasing microsecond instants.
//!
//! Non-UTC inputs are **rejected at parse time** — there is no silent
//! conversion that could introduce ambiguity between equivalent instants
//! rendered in different offsets.

use chrono::{DateTime, Duration, Months, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to microsecond precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-microseconds.
/// - [`Timestamp::parse()`] — from an RFC 3339 string, rejecting non-UTC offsets.
/// - [`Timestamp::from_epoch_micros()`] — from a Unix microsecond count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time.
    pub fn now() -> Self {
        Self(truncate_to_micros(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_micros(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// **Rejects non-UTC inputs.** Only timestamps with the `Z` suffix are
    /// accepted; explicit offsets like `+00:00` or `+05:30` are rejected,
    /// even when semantically equivalent to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] if the string is not valid
    /// RFC 3339 or uses a non-Z offset.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "must use Z suffix (UTC only), got: {s:?}"
            )));
        }

        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::InvalidTimestamp(format!("{s:?}: {e}")))?;

        Ok(Self(truncate_to_micros(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from a Unix epoch microsecond count.
    pub fn from_epoch_micros(micros: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            CoreError::InvalidTimestamp(format!("epoch micros out of range: {micros}"))
        })?;
        Ok(Self(dt))
    }

    /// Returns the Unix epoch timestamp in microseconds.
    pub fn epoch_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Calendar-aware addition of whole months (key validity windows).
    ///
    /// Returns `None` if the result would be out of range.
    pub fn checked_add_months(&self, months: u32) -> Option<Self> {
        self.0.checked_add_months(Months::new(months)).map(Self)
    }

    /// Addition of whole days (EMI installment scheduling).
    ///
    /// Returns `None` if the result would be out of range.
    pub fn checked_add_days(&self, days: i64) -> Option<Self> {
        Duration::try_days(days)
            .and_then(|d| self.0.checked_add_signed(d))
            .map(Self)
    }

    /// Render as RFC 3339 with microseconds and Z suffix
    /// (e.g., `2026-01-15T12:00:00.000000Z`).
    pub fn to_rfc3339(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

/// Truncate a `DateTime<Utc>` to microsecond precision.
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond();
    dt.with_nanosecond(nanos - nanos % 1_000).unwrap_or(dt)
}

//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a timestamp from a DateTime carrying any fixed offset.
    pub fn from_offset_datetime(dt: DateTime<FixedOffset>) -> Self {
        Self(dt.with_timezone(&Utc))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns this instant expressed at the given offset.
    pub fn at_offset(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        self.0.with_timezone(&offset)
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn timestamp_from_offset_datetime_normalizes_to_utc() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T10:30:00+05:30").unwrap();
        let ts = Timestamp::from_offset_datetime(dt);

        assert_eq!(ts.as_datetime().hour(), 5);
        assert_eq!(ts.as_datetime().minute(), 0);
    }

    #[test]
    fn timestamp_at_offset_shifts_wall_clock() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T20:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();

        let local = Timestamp::from_datetime(dt).at_offset(ist);
        assert_eq!(local.day(), 16);
        assert_eq!(local.hour(), 1);
        assert_eq!(local.minute(), 30);
    }

    #[test]
    fn timestamp_minus_days_and_duration_since_agree() {
        let ts = Timestamp::now();
        let earlier = ts.minus_days(2);

        assert!(earlier.is_before(&ts));
        assert_eq!(ts.duration_since(&earlier), Duration::days(2));
    }

    #[test]
    fn timestamp_deserializes_from_json() {
        let json = "\"2024-01-15T10:30:00Z\"";
        let ts: Timestamp = serde_json::from_str(json).unwrap();

        assert_eq!(ts.as_datetime().year(), 2024);
    }
}

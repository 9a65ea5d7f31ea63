//! Time ranges and sample intervals
//!
//! Requests accept times in any zone; they are converted to UTC here and
//! stay UTC through query building and normalization. Snapshot reads are
//! the one case without a stop time, so the range's stop is optional.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed time interval `[start, stop]` for a read.
///
/// `stop` is absent only for snapshot reads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    /// Start of the range (inclusive), UTC
    pub start: DateTime<Utc>,
    /// End of the range (inclusive), UTC; absent for snapshot reads
    pub stop: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Create a bounded range, converting both endpoints to UTC
    ///
    /// # Panics
    /// Panics if start > stop
    pub fn new<Tz: TimeZone>(start: DateTime<Tz>, stop: DateTime<Tz>) -> Self {
        let start = start.with_timezone(&Utc);
        let stop = stop.with_timezone(&Utc);
        assert!(start <= stop, "TimeRange: start must not be after stop");
        Self {
            start,
            stop: Some(stop),
        }
    }

    /// Create a bounded range, returning None if inverted
    pub fn try_new<Tz: TimeZone>(start: DateTime<Tz>, stop: DateTime<Tz>) -> Option<Self> {
        let start = start.with_timezone(&Utc);
        let stop = stop.with_timezone(&Utc);
        (start <= stop).then_some(Self {
            start,
            stop: Some(stop),
        })
    }

    /// Create an open-ended range (snapshot reads)
    pub fn from_start<Tz: TimeZone>(start: DateTime<Tz>) -> Self {
        Self {
            start: start.with_timezone(&Utc),
            stop: None,
        }
    }

    /// Range covering the last N hours, ending now
    pub fn last_hours(hours: i64) -> Self {
        let stop = Utc::now();
        Self {
            start: stop - Duration::hours(hours),
            stop: Some(stop),
        }
    }

    /// Range covering the last N days, ending now
    pub fn last_days(days: i64) -> Self {
        Self::last_hours(days * 24)
    }

    /// Length of the range, if bounded
    pub fn duration(&self) -> Option<Duration> {
        self.stop.map(|stop| stop - self.start)
    }
}

/// Non-negative sampling interval for interpolated and aggregated reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SampleInterval(Duration);

impl SampleInterval {
    /// Wrap a duration
    ///
    /// # Panics
    /// Panics if the duration is negative
    pub fn new(duration: Duration) -> Self {
        assert!(
            duration >= Duration::zero(),
            "SampleInterval: interval must not be negative"
        );
        Self(duration)
    }

    /// Wrap a duration, returning None if negative
    pub fn try_new(duration: Duration) -> Option<Self> {
        (duration >= Duration::zero()).then_some(Self(duration))
    }

    /// Interval of N whole seconds
    pub fn from_seconds(seconds: i64) -> Self {
        Self::new(Duration::seconds(seconds))
    }

    /// Interval of N whole minutes
    pub fn from_minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    /// Zero interval (raw, sampled and snapshot reads)
    pub fn zero() -> Self {
        Self(Duration::zero())
    }

    /// Whole seconds, fractional part truncated
    pub fn whole_seconds(&self) -> i64 {
        self.0.num_seconds()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for SampleInterval {
    fn default() -> Self {
        Self::zero()
    }
}

// Serialized as whole seconds; chrono's serde does not cover Duration.
impl Serialize for SampleInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.whole_seconds())
    }
}

impl<'de> Deserialize<'de> for SampleInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        SampleInterval::try_new(Duration::seconds(seconds))
            .ok_or_else(|| serde::de::Error::custom("sample interval must not be negative"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_range_converts_to_utc() {
        let oslo = FixedOffset::east_opt(3600).unwrap();
        let start = oslo.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap();
        let stop = oslo.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap();

        let range = TimeRange::new(start, stop);
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(
            range.stop,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_try_new_rejects_inverted() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(TimeRange::try_new(start, stop).is_none());
        assert!(TimeRange::try_new(stop, start).is_some());
        // Equal endpoints are allowed
        assert!(TimeRange::try_new(start, start).is_some());
    }

    #[test]
    fn test_open_range_has_no_duration() {
        let range = TimeRange::from_start(Utc::now());
        assert_eq!(range.stop, None);
        assert_eq!(range.duration(), None);
    }

    #[test]
    fn test_last_hours() {
        let range = TimeRange::last_hours(24);
        assert_eq!(range.duration(), Some(Duration::hours(24)));
    }

    #[test]
    fn test_interval_seconds() {
        assert_eq!(SampleInterval::from_seconds(60).whole_seconds(), 60);
        assert_eq!(SampleInterval::from_minutes(3).whole_seconds(), 180);
        assert!(SampleInterval::zero().is_zero());
        assert!(SampleInterval::try_new(Duration::seconds(-1)).is_none());
    }

    #[test]
    fn test_interval_serde_round_trip() {
        let interval = SampleInterval::from_seconds(600);
        let json = serde_json::to_string(&interval).unwrap();
        assert_eq!(json, "600");
        let back: SampleInterval = serde_json::from_str(&json).unwrap();
        assert_eq!(back, interval);

        let negative: Result<SampleInterval, _> = serde_json::from_str("-5");
        assert!(negative.is_err());
    }
}

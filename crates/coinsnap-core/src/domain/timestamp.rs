use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Instant in UTC, rendered as RFC3339 with `Z`.
///
/// Snapshot rows keep the full precision; partitions are keyed by
/// [`UtcDateTime::minute_partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Accepts RFC3339 with a zero offset only.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        OffsetDateTime::parse(input, &Rfc3339)
            .ok()
            .filter(|parsed| parsed.offset() == UtcOffset::UTC)
            .map(Self)
            .ok_or_else(|| ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            })
    }

    /// Same instant with seconds and sub-seconds cleared.
    pub fn truncate_to_minute(self) -> Self {
        self.0
            .replace_second(0)
            .and_then(|at| at.replace_nanosecond(0))
            .map(Self)
            .unwrap_or(self)
    }

    /// Relative partition file for the minute containing this instant:
    /// `YYYY/MM/DD/prices-HHMM.csv`.
    pub fn minute_partition(self) -> PathBuf {
        let at = self.truncate_to_minute().0;
        let mut path = PathBuf::from(format!("{:04}", at.year()));
        path.push(format!("{:02}", u8::from(at.month())));
        path.push(format!("{:02}", at.day()));
        path.push(format!("prices-{:02}{:02}.csv", at.hour(), at.minute()));
        path
    }

    /// RFC3339 rendering; zero sub-seconds are omitted.
    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.to_string())
    }
}

impl FromStr for UtcDateTime {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_seconds_survive_formatting() {
        let parsed: UtcDateTime = "2024-01-01T00:00:30.123456Z".parse().expect("must parse");
        assert_eq!(parsed.to_string(), "2024-01-01T00:00:30.123456Z");
    }

    #[test]
    fn offsets_other_than_zero_are_rejected() {
        let err = UtcDateTime::parse("2024-01-01T01:00:00+01:00").expect_err("must fail");
        assert!(matches!(err, ValidationError::TimestampNotUtc { .. }));
    }

    #[test]
    fn every_instant_of_a_minute_maps_to_one_partition() {
        let first = UtcDateTime::parse("2024-03-09T07:05:00Z").expect("must parse");
        let last = UtcDateTime::parse("2024-03-09T07:05:59.999Z").expect("must parse");

        assert_eq!(last.truncate_to_minute(), first);
        assert_eq!(
            last.minute_partition(),
            PathBuf::from("2024").join("03").join("09").join("prices-0705.csv")
        );
        assert_eq!(first.minute_partition(), last.minute_partition());
    }

    #[test]
    fn round_trips_through_json_as_a_string() {
        let at = UtcDateTime::parse("2024-12-31T23:59:59Z").expect("must parse");
        let json = serde_json::to_string(&at).expect("serialize");
        assert_eq!(json, "\"2024-12-31T23:59:59Z\"");
        let back: UtcDateTime = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, at);
    }
}

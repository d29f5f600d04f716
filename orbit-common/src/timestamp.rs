//! Compact `YYYYMMDDTHHMMSS` timestamps
//!
//! Sentinel-1 product and orbit file names carry naive UTC timestamps at
//! second precision. The same text form is used on the wire and in the
//! index table, so values round-trip byte-for-byte.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of the textual form: 8 date digits, `T`, 6 time digits
const COMPACT_LEN: usize = 15;
const SEPARATOR_POS: usize = 8;
const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("'{0}' is not a compact timestamp (expected YYYYMMDDTHHMMSS)")]
    Malformed(String),
    #[error("'{0}' is not a valid calendar date and time")]
    OutOfRange(String),
}

/// Naive UTC timestamp at second precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompactTimestamp(NaiveDateTime);

impl CompactTimestamp {
    /// Wrap a chrono value, dropping any sub-second part.
    pub fn from_naive(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Shift back by whole days. Saturates at the earliest representable instant.
    pub fn minus_days(self, days: i64) -> Self {
        self.0
            .checked_sub_signed(TimeDelta::days(days))
            .map(Self)
            .unwrap_or(Self(NaiveDateTime::MIN))
    }
}

impl std::str::FromStr for CompactTimestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == COMPACT_LEN
            && bytes.iter().enumerate().all(|(i, b)| {
                if i == SEPARATOR_POS {
                    *b == b'T'
                } else {
                    b.is_ascii_digit()
                }
            });
        if !well_formed {
            return Err(TimestampError::Malformed(s.to_string()));
        }

        // The shape is fixed above, so chrono can only object to the values.
        // A parsed `60` second is a leap second and has no compact form.
        NaiveDateTime::parse_from_str(s, COMPACT_FORMAT)
            .ok()
            .filter(|value| value.nanosecond() == 0)
            .map(Self)
            .ok_or_else(|| TimestampError::OutOfRange(s.to_string()))
    }
}

impl std::fmt::Display for CompactTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(COMPACT_FORMAT))
    }
}

impl Serialize for CompactTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompactTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

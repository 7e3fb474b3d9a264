//! # Timestamps
//!
//! The campus API renders every timestamp as `DD/MM/YYYY HH:MM` (24h clock,
//! minute precision). [`Timestamp`] parses exactly that shape and nothing
//! else, so a malformed value is rejected instead of silently becoming a
//! bogus date that would corrupt ordering.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wire format used by the campus API.
pub const WIRE_FORMAT: &str = "%d/%m/%Y %H:%M";

const WIRE_LEN: usize = 16;

/// Errors raised when a timestamp string does not match the wire format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimestampError {
    /// The string does not have the `DD/MM/YYYY HH:MM` shape.
    #[error("malformed timestamp {input:?}: expected DD/MM/YYYY HH:MM")]
    Malformed { input: String },

    /// The shape is right but the values do not form a real date or time.
    #[error("timestamp {input:?} is out of range")]
    OutOfRange { input: String },
}

/// A minute-precision local timestamp as reported by the campus API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub NaiveDateTime);

impl Timestamp {
    /// Parse a `DD/MM/YYYY HH:MM` string.
    ///
    /// # Errors
    /// Returns [`TimestampError::Malformed`] when the shape differs in any way
    /// (single-digit fields, seconds, other separators, trailing text) and
    /// [`TimestampError::OutOfRange`] for impossible calendar values.
    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        let bytes = input.as_bytes();
        let malformed = || TimestampError::Malformed {
            input: input.to_string(),
        };

        if bytes.len() != WIRE_LEN {
            return Err(malformed());
        }
        for (index, byte) in bytes.iter().enumerate() {
            let ok = match index {
                2 | 5 => *byte == b'/',
                10 => *byte == b' ',
                13 => *byte == b':',
                _ => byte.is_ascii_digit(),
            };
            if !ok {
                return Err(malformed());
            }
        }

        let field = |range: std::ops::Range<usize>| -> u32 {
            bytes[range]
                .iter()
                .fold(0, |acc, digit| acc * 10 + u32::from(digit - b'0'))
        };
        let day = field(0..2);
        let month = field(3..5);
        let year = field(6..10);
        let hour = field(11..13);
        let minute = field(14..16);

        let out_of_range = || TimestampError::OutOfRange {
            input: input.to_string(),
        };
        let year = i32::try_from(year).map_err(|_| out_of_range())?;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(out_of_range)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(out_of_range)?;

        Ok(Self(NaiveDateTime::new(date, time)))
    }

    /// Build a timestamp from calendar parts. Returns `None` for invalid values.
    #[must_use]
    pub fn from_parts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some(Self(NaiveDateTime::new(date, time)))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

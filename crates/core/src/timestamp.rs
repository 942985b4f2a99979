//! Oplog positions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A position in the oplog stream
///
/// Ordered by `seconds`, then `increment`. The field order matters: the
/// derived `Ord` compares fields top to bottom.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Timestamp {
    /// Wall-clock seconds since the Unix epoch
    pub seconds: u32,
    /// Ordinal of the operation within `seconds`
    pub increment: u32,
}

impl Timestamp {
    pub const fn new(seconds: u32, increment: u32) -> Self {
        Self { seconds, increment }
    }

    /// Compact `seconds-increment` form, safe for use in directory names
    pub fn to_slug(&self) -> String {
        format!("{}-{}", self.seconds, self.increment)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.seconds, self.increment)
    }
}

/// Error returned when parsing a `seconds:increment` string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid oplog timestamp '{0}': expected <seconds>:<increment>")]
pub struct ParseTimestampError(String);

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimestampError(s.to_string());
        let (seconds, increment) = s.trim().split_once(':').ok_or_else(err)?;
        Ok(Self {
            seconds: seconds.parse().map_err(|_| err())?,
            increment: increment.parse().map_err(|_| err())?,
        })
    }
}

/// True if every timestamp is strictly greater than the one before it
pub fn strictly_increasing(timestamps: &[Timestamp]) -> bool {
    timestamps.windows(2).all(|pair| pair[0] < pair[1])
}

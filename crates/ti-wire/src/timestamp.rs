//! Composite timestamp: whole seconds since the Unix epoch plus a nanosecond
//! offset, carried on the wire as a nested message with tag 1 (seconds) and
//! tag 2 (nanos). Either field is omitted when it is zero.

use chrono::{DateTime, Utc};
use std::fmt;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Decoded timestamp instant.
///
/// Fields are kept exactly as they appeared on the wire; no normalisation of
/// out-of-range nanos is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    /// The zero instant, encoded as an empty payload.
    pub const EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    pub fn new(seconds: i64, nanos: i32) -> Self {
        Timestamp { seconds, nanos }
    }

    pub fn is_epoch(&self) -> bool {
        *self == Self::EPOCH
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos() as i32,
        }
    }

    /// Convert to a calendar instant. `None` when nanos are outside
    /// `0..1_000_000_000` or seconds are beyond chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.nanos).ok()?;
        if i64::from(nanos) >= NANOS_PER_SECOND {
            return None;
        }
        DateTime::from_timestamp(self.seconds, nanos)
    }

    /// Nanoseconds since the epoch, if representable in an i64.
    pub fn as_nanos(&self) -> Option<i64> {
        self.seconds
            .checked_mul(NANOS_PER_SECOND)?
            .checked_add(i64::from(self.nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
            None => write!(f, "{}s+{}ns", self.seconds, self.nanos),
        }
    }
}

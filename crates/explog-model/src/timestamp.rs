use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::ModelError;

/// Point in time as stored by the remote log server.
///
/// The server mixes several encodings for the same logical value, so decoding accepts:
/// - RFC 3339 strings (`2024-01-01T00:00:00Z`, fraction and offset optional);
/// - naive ISO strings without an offset (`2024-01-01T00:00:00`), read as UTC;
/// - producer strings in the `YYYY-MM-DD-HH:MM:SS` layout, read as UTC;
/// - JSON numbers holding milliseconds since the Unix epoch (fraction allowed).
///
/// Encoding always produces RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    pub fn new(at: OffsetDateTime) -> Self {
        Self(at)
    }

    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Build from milliseconds since the Unix epoch.
    pub fn from_unix_millis(ms: f64) -> Result<Self, ModelError> {
        if !ms.is_finite() {
            return Err(ModelError::InvalidTimestamp(ms.to_string()));
        }
        let nanos = (ms * 1_000_000.0).round() as i128;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map(Self)
            .map_err(|_| ModelError::InvalidTimestamp(ms.to_string()))
    }

    /// Parse any of the textual layouts the server emits.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let s = s.trim();
        if let Ok(at) = OffsetDateTime::parse(s, &Rfc3339) {
            return Ok(Self(at));
        }

        let naive = format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
        );
        if let Ok(at) = PrimitiveDateTime::parse(s, naive) {
            return Ok(Self(at.assume_utc()));
        }

        let producer = format_description!("[year]-[month]-[day]-[hour]:[minute]:[second]");
        if let Ok(at) = PrimitiveDateTime::parse(s, producer) {
            return Ok(Self(at.assume_utc()));
        }

        Err(ModelError::InvalidTimestamp(s.to_string()))
    }

    pub fn as_offset(&self) -> OffsetDateTime {
        self.0
    }

    /// Milliseconds since the Unix epoch, truncated.
    pub fn unix_millis(&self) -> i64 {
        (self.0.unix_timestamp_nanos() / 1_000_000) as i64
    }

    /// Signed distance from `earlier` to `self`.
    pub fn since(&self, earlier: &Timestamp) -> Duration {
        self.0 - earlier.0
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(at: OffsetDateTime) -> Self {
        Self(at)
    }
}

impl FromStr for Timestamp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Millis(ms) => Timestamp::from_unix_millis(ms),
            RawTimestamp::Text(s) => Timestamp::parse(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}

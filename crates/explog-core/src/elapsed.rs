use explog_model::Elapsed;
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::warn;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

/// How a finished configuration's run time is broken into days/hours/minutes/seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElapsedMode {
    /// Integer division of the delta. Negative deltas clamp to zero.
    #[default]
    Duration,
    /// Same numbers as the legacy web viewer.
    ///
    /// The millisecond delta is read as an instant after the Unix epoch, shifted into `offset`,
    /// and its calendar fields are reported as `day - 1`, `hour - 1`, `minute`, `second`.
    /// Wraps after a month, and reports `-1` hours for sub-hour deltas at UTC.
    Calendar { offset: UtcOffset },
}

impl ElapsedMode {
    /// Calendar mode in the host zone, falling back to UTC when it can't be determined.
    ///
    /// Must run before other threads start; `time` refuses local lookups afterwards.
    pub fn calendar_local() -> Self {
        Self::calendar_in(|at| UtcOffset::local_offset_at(at).ok())
    }

    /// Calendar mode in the offset `zone` had at the Unix epoch.
    ///
    /// Decomposed deltas are read as instants just after 1970-01-01, so the epoch offset applies,
    /// not today's (which may include daylight saving time).
    pub fn calendar_in(zone: impl FnOnce(OffsetDateTime) -> Option<UtcOffset>) -> Self {
        let offset = zone(OffsetDateTime::UNIX_EPOCH).unwrap_or(UtcOffset::UTC);
        ElapsedMode::Calendar { offset }
    }

    pub fn decompose(&self, delta: Duration) -> Elapsed {
        match self {
            ElapsedMode::Duration => by_division(delta),
            ElapsedMode::Calendar { offset } => by_calendar(delta, *offset),
        }
    }
}

fn by_division(delta: Duration) -> Elapsed {
    let secs = delta.whole_seconds();
    if secs <= 0 {
        return Elapsed::ZERO;
    }
    Elapsed {
        days: secs / SECS_PER_DAY,
        hours: secs % SECS_PER_DAY / SECS_PER_HOUR,
        minutes: secs % SECS_PER_HOUR / SECS_PER_MINUTE,
        seconds: secs % SECS_PER_MINUTE,
    }
}

fn by_calendar(delta: Duration, offset: UtcOffset) -> Elapsed {
    // Shifting the instant and reading UTC fields equals reading fields in `offset`.
    let millis = delta.whole_milliseconds() + i128::from(offset.whole_seconds()) * 1_000;
    let at = match OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000) {
        Ok(at) => at,
        Err(e) => {
            warn!("elapsed delta out of calendar range: {}", e);
            return Elapsed::ZERO;
        }
    };
    Elapsed {
        days: i64::from(at.day()) - 1,
        hours: i64::from(at.hour()) - 1,
        minutes: i64::from(at.minute()),
        seconds: i64::from(at.second()),
    }
}

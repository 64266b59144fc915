use std::fmt;

use serde::{Deserialize, Serialize};

/// Time a configuration took, measured from the start of its run.
///
/// Fields are signed: the calendar-compatible decomposition can legitimately yield `-1` hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Elapsed {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Elapsed {
    pub const ZERO: Elapsed = Elapsed {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    pub fn new(days: i64, hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }
}

impl fmt::Display for Elapsed {
    /// Renders `1d 2h 3m 4s`, dropping leading zero units (`5m 30s`, `0s`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = [
            (self.days, "d"),
            (self.hours, "h"),
            (self.minutes, "m"),
            (self.seconds, "s"),
        ];
        let first = units
            .iter()
            .position(|(v, _)| *v != 0)
            .unwrap_or(units.len() - 1);

        let mut sep = "";
        for (value, unit) in &units[first..] {
            write!(f, "{sep}{value}{unit}")?;
            sep = " ";
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Elapsed;

    #[test]
    fn display_drops_leading_zero_units() {
        assert_eq!(Elapsed::new(0, 0, 5, 30).to_string(), "5m 30s");
        assert_eq!(Elapsed::new(1, 0, 0, 2).to_string(), "1d 0h 0m 2s");
        assert_eq!(Elapsed::ZERO.to_string(), "0s");
    }

    #[test]
    fn display_keeps_negative_fields() {
        assert_eq!(Elapsed::new(0, -1, 5, 30).to_string(), "-1h 5m 30s");
    }
}

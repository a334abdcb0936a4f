//! Rolling intervals and the checkpoints they induce.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity at which log files roll over.
///
/// `Infinite` means rolling is purely size driven: no checkpoint is ever
/// embedded in a file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollingInterval {
    #[default]
    #[serde(alias = "none")]
    Infinite,
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

/// A point in time truncated to a [`RollingInterval`].
///
/// Two timestamps that truncate to the same value belong to the same
/// checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checkpoint(NaiveDateTime);

impl Checkpoint {
    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RollingInterval {
    /// Number of digits in the checkpoint token, zero when no token is used.
    pub(crate) fn token_len(self) -> usize {
        match self {
            RollingInterval::Infinite => 0,
            RollingInterval::Year => 4,
            RollingInterval::Month => 6,
            RollingInterval::Day => 8,
            RollingInterval::Hour => 10,
            RollingInterval::Minute => 12,
        }
    }

    fn token_format(self) -> &'static str {
        match self {
            RollingInterval::Infinite => "",
            RollingInterval::Year => "%Y",
            RollingInterval::Month => "%Y%m",
            RollingInterval::Day => "%Y%m%d",
            RollingInterval::Hour => "%Y%m%d%H",
            RollingInterval::Minute => "%Y%m%d%H%M",
        }
    }

    /// Truncates `now` to this interval. `None` for [`RollingInterval::Infinite`].
    pub fn checkpoint(self, now: NaiveDateTime) -> Option<Checkpoint> {
        let midnight = now.date().and_time(NaiveTime::MIN);

        let truncated = match self {
            RollingInterval::Infinite => return None,
            RollingInterval::Year => {
                (now.date() - Days::new(u64::from(now.ordinal0()))).and_time(NaiveTime::MIN)
            }
            RollingInterval::Month => {
                (now.date() - Days::new(u64::from(now.day0()))).and_time(NaiveTime::MIN)
            }
            RollingInterval::Day => midnight,
            RollingInterval::Hour => midnight + TimeDelta::hours(i64::from(now.hour())),
            RollingInterval::Minute => {
                midnight + TimeDelta::minutes(i64::from(now.hour() * 60 + now.minute()))
            }
        };

        Some(Checkpoint(truncated))
    }

    /// The earliest instant after `now` whose checkpoint differs from the
    /// checkpoint of `now`.
    ///
    /// `None` when rolling is not time based, or when the boundary is not
    /// representable.
    pub fn next_checkpoint(self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let current = self.checkpoint(now)?.as_datetime();

        match self {
            RollingInterval::Infinite => None,
            RollingInterval::Year => current.checked_add_months(Months::new(12)),
            RollingInterval::Month => current.checked_add_months(Months::new(1)),
            RollingInterval::Day => current.checked_add_days(Days::new(1)),
            RollingInterval::Hour => current.checked_add_signed(TimeDelta::hours(1)),
            RollingInterval::Minute => current.checked_add_signed(TimeDelta::minutes(1)),
        }
    }

    /// Canonical text form of a checkpoint, as embedded in file names.
    pub(crate) fn format_token(self, checkpoint: Option<Checkpoint>) -> String {
        match checkpoint {
            Some(checkpoint) if self != RollingInterval::Infinite => checkpoint
                .as_datetime()
                .format(self.token_format())
                .to_string(),
            _ => String::new(),
        }
    }

    /// Parses a checkpoint token produced by [`Self::format_token`].
    ///
    /// Only accepts tokens that denote a truncated checkpoint: the digit count
    /// must match the interval and every component must be in range.
    pub(crate) fn parse_token(self, token: &str) -> Option<Checkpoint> {
        if token.len() != self.token_len() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let field = |range: std::ops::Range<usize>| -> Option<u32> { token.get(range)?.parse().ok() };

        let year: i32 = token.get(0..4)?.parse().ok()?;
        let month = if token.len() >= 6 { field(4..6)? } else { 1 };
        let day = if token.len() >= 8 { field(6..8)? } else { 1 };
        let hour = if token.len() >= 10 { field(8..10)? } else { 0 };
        let minute = if token.len() >= 12 { field(10..12)? } else { 0 };

        let datetime = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
        Some(Checkpoint(datetime))
    }
}

impl fmt::Display for RollingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RollingInterval::Infinite => "infinite",
            RollingInterval::Year => "year",
            RollingInterval::Month => "month",
            RollingInterval::Day => "day",
            RollingInterval::Hour => "hour",
            RollingInterval::Minute => "minute",
        };
        f.write_str(name)
    }
}

impl FromStr for RollingInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "infinite" | "none" => Ok(RollingInterval::Infinite),
            "year" => Ok(RollingInterval::Year),
            "month" => Ok(RollingInterval::Month),
            "day" => Ok(RollingInterval::Day),
            "hour" => Ok(RollingInterval::Hour),
            "minute" => Ok(RollingInterval::Minute),
            other => Err(format!(
                "unknown rolling interval '{}', expected one of: infinite, year, month, day, hour, minute",
                other
            )),
        }
    }
}

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::busy::TimeInterval;
use crate::error::SchedulerError;

/// The part of each calendar day where scheduling is allowed, as wall-clock
/// times in a named time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    earliest: NaiveTime,
    latest: NaiveTime,
    time_zone: Tz,
}

impl DailyWindow {
    pub fn new(earliest: NaiveTime, latest: NaiveTime, time_zone: Tz) -> Result<Self, SchedulerError> {
        if earliest >= latest {
            return Err(SchedulerError::InvalidWindow(format!(
                "earliest time {} must be before latest time {}",
                earliest.format("%H:%M"),
                latest.format("%H:%M")
            )));
        }
        Ok(Self {
            earliest,
            latest,
            time_zone,
        })
    }

    /// Builds a window from `"HH:MM"` strings and an IANA zone name.
    pub fn parse(earliest: &str, latest: &str, time_zone: &str) -> Result<Self, SchedulerError> {
        let tz: Tz = time_zone
            .parse()
            .map_err(|_| SchedulerError::InvalidWindow(format!("unknown time zone '{}'", time_zone)))?;
        Self::new(parse_time(earliest)?, parse_time(latest)?, tz)
    }

    pub fn earliest(&self) -> NaiveTime {
        self.earliest
    }

    pub fn latest(&self) -> NaiveTime {
        self.latest
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// The window's instants on `date`.
    ///
    /// A bound that falls in a DST gap moves inward to the nearest wall-clock
    /// minute that exists. `None` only when the gap swallows the whole window,
    /// which the slot finder treats as "no available time".
    pub fn bounds_for(&self, date: NaiveDate) -> Option<TimeInterval> {
        let first = date.and_time(self.earliest);
        let last = date.and_time(self.latest);
        let one_minute = Duration::minutes(1);

        let mut local = first;
        let start = loop {
            if local >= last {
                return None;
            }
            if let Some(start) = self.time_zone.from_local_datetime(&local).earliest() {
                break start;
            }
            local += one_minute;
        };

        let mut local = last;
        let end = loop {
            if local <= first {
                return None;
            }
            if let Some(end) = self.time_zone.from_local_datetime(&local).latest() {
                break end;
            }
            local -= one_minute;
        };

        TimeInterval::new(start.with_timezone(&Utc), end.with_timezone(&Utc)).ok()
    }

    /// Calendar date of `instant` in the window's zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.time_zone).date_naive()
    }
}

/// Parses `"HH:MM"` (also accepts `"HH:MM:SS"`).
pub fn parse_time(value: &str) -> Result<NaiveTime, SchedulerError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| SchedulerError::InvalidWindow(format!("'{}' is not a valid HH:MM time", value)))
}

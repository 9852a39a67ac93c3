//! Busy-interval model.
//!
//! Free/busy data arrives from the calendar backend as raw `(start, end)`
//! pairs. [`normalize`] turns it into ordered, well-formed [`TimeInterval`]s the
//! slot finder can sweep.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Half-open interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SchedulerError> {
        if start >= end {
            return Err(SchedulerError::InvalidInterval(format!(
                "start {} is not before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Interval of `duration` starting at `start`; `None` for non-positive durations.
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Option<Self> {
        let end = start.checked_add_signed(duration)?;
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap test. Touching intervals do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Drops degenerate periods (`end <= start`) and sorts the rest by start.
///
/// Overlapping periods are kept as they are; the sweep advances its cursor
/// with `max` and copes with them.
pub fn normalize(raw: &[(DateTime<Utc>, DateTime<Utc>)]) -> Vec<TimeInterval> {
    let mut intervals: Vec<TimeInterval> = raw
        .iter()
        .filter_map(|&(start, end)| TimeInterval::new(start, end).ok())
        .collect();
    intervals.sort();
    intervals
}

/// Folds overlapping or touching intervals together. Output is sorted.
pub fn merge(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut sorted = intervals.to_vec();
    sorted.sort();

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_and_inverted() {
        assert!(TimeInterval::new(at(9, 0), at(9, 0)).is_err());
        assert!(TimeInterval::new(at(10, 0), at(9, 0)).is_err());
        assert!(TimeInterval::new(at(9, 0), at(9, 1)).is_ok());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = TimeInterval::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeInterval::new(at(10, 0), at(11, 0)).unwrap();
        let c = TimeInterval::new(at(9, 59), at(10, 30)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_normalize_sorts_and_drops_degenerate() {
        let raw = vec![
            (at(13, 0), at(14, 0)),
            (at(9, 0), at(9, 0)),
            (at(8, 0), at(12, 0)),
            (at(11, 0), at(10, 0)),
        ];
        let normalized = normalize(&raw);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].start(), at(8, 0));
        assert_eq!(normalized[1].start(), at(13, 0));
    }

    #[test]
    fn test_merge_folds_overlapping_and_touching() {
        let intervals = normalize(&[
            (at(9, 0), at(10, 0)),
            (at(9, 30), at(11, 0)),
            (at(11, 0), at(11, 30)),
            (at(14, 0), at(15, 0)),
        ]);
        let merged = merge(&intervals);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], TimeInterval::new(at(9, 0), at(11, 30)).unwrap());
        assert_eq!(merged[1], TimeInterval::new(at(14, 0), at(15, 0)).unwrap());
    }
}

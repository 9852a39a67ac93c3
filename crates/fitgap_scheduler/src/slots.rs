//! Slot finder.
//!
//! Two search policies over the same busy model:
//!
//! * [`gap_sweep`] walks sorted busy intervals once and emits the earliest
//!   start of every gap that fits the duration. Used for listing many free
//!   slots over a horizon ([`find_free_slots`]).
//! * [`interval_probe`] tries step-aligned starts from the window start and
//!   returns the first one that fits. The reconciler uses it, feeding its own
//!   same-run placements back in as busy intervals.
//!
//! Both treat busy intervals as half-open and only return slots that lie inside
//! the window and start strictly after `not_before`. Running out of candidates
//! is an ordinary outcome, not an error.

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use tracing::debug;

use crate::busy::{merge, TimeInterval};
use crate::window::DailyWindow;

/// Step between interval-probe candidates, independent of the requested duration.
pub const PROBE_STEP_MINUTES: i64 = 15;

/// Earliest fitting slot of every gap inside `window`, in start order.
///
/// `busy` must be sorted by start (see [`crate::busy::normalize`]); overlaps
/// are fine.
pub fn gap_sweep(
    window: &TimeInterval,
    duration: Duration,
    busy: &[TimeInterval],
    not_before: DateTime<Utc>,
) -> Vec<TimeInterval> {
    let mut slots = Vec::new();
    if duration <= Duration::zero() {
        return slots;
    }

    let mut cursor = window.start();
    if not_before >= cursor {
        cursor = first_minute_after(not_before);
    }

    for interval in busy {
        if interval.start() >= window.end() {
            break;
        }
        let gap_end = interval.start().min(window.end());
        if let Some(slot) = fitting_slot(cursor, duration, gap_end) {
            slots.push(slot);
        }
        cursor = cursor.max(interval.end());
    }

    if let Some(slot) = fitting_slot(cursor, duration, window.end()) {
        slots.push(slot);
    }
    slots
}

/// The earliest gap-sweep slot, if any.
pub fn earliest_gap(
    window: &TimeInterval,
    duration: Duration,
    busy: &[TimeInterval],
    not_before: DateTime<Utc>,
) -> Option<TimeInterval> {
    gap_sweep(window, duration, busy, not_before).into_iter().next()
}

/// First [`PROBE_STEP_MINUTES`]-aligned start (counted from the window start)
/// whose slot fits inside the window, starts after `not_before` and overlaps no
/// busy interval.
///
/// `busy` may be in any order.
pub fn interval_probe(
    window: &TimeInterval,
    duration: Duration,
    busy: &[TimeInterval],
    not_before: DateTime<Utc>,
) -> Option<TimeInterval> {
    let step = Duration::minutes(PROBE_STEP_MINUTES);
    let mut candidate_start = window.start();

    loop {
        let candidate = TimeInterval::starting_at(candidate_start, duration)?;
        if candidate.end() > window.end() {
            return None;
        }
        if candidate.start() > not_before && !busy.iter().any(|b| candidate.overlaps(b)) {
            return Some(candidate);
        }
        candidate_start = candidate_start.checked_add_signed(step)?;
    }
}

/// Free slots of `duration` over the given days, at most one per gap, in
/// chronological order, capped at `limit`.
pub fn find_free_slots(
    days: &[NaiveDate],
    window: &DailyWindow,
    duration: Duration,
    busy: &[TimeInterval],
    not_before: DateTime<Utc>,
    limit: Option<usize>,
) -> Vec<TimeInterval> {
    let merged = merge(busy);
    let mut slots = Vec::new();

    for day in days {
        let Some(bounds) = window.bounds_for(*day) else {
            debug!("No eligible window on {}", day);
            continue;
        };
        for slot in gap_sweep(&bounds, duration, &merged, not_before) {
            if limit.is_some_and(|max| slots.len() >= max) {
                return slots;
            }
            slots.push(slot);
        }
    }
    slots
}

fn fitting_slot(
    cursor: DateTime<Utc>,
    duration: Duration,
    gap_end: DateTime<Utc>,
) -> Option<TimeInterval> {
    let slot = TimeInterval::starting_at(cursor, duration)?;
    (slot.end() <= gap_end).then_some(slot)
}

/// First whole minute strictly after `instant`.
fn first_minute_after(instant: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = instant
        .duration_trunc(Duration::minutes(1))
        .unwrap_or(instant);
    truncated + Duration::minutes(1)
}

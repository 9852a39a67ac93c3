//! Splits a calendar's events into owned (created by FitGap) and foreign.
//!
//! An event is owned when it carries the private `fitgap_kind` marker, or when
//! its title contains one of the fixed activity labels. The marker wins when
//! both are present. Foreign events are never counted or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use fitgap_common::services::BookedEvent;
use std::collections::HashSet;

use crate::busy::TimeInterval;
use crate::plan::ActivityKind;
use crate::report::PerKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedEvent {
    pub event_id: String,
    pub kind: ActivityKind,
    pub summary: String,
    /// `None` for all-day entries; those are owned but never fill a quota.
    pub interval: Option<TimeInterval>,
}

impl OwnedEvent {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.interval.map(|i| i.start())
    }

    /// Calendar date of the start in `tz`.
    pub fn local_date(&self, tz: Tz) -> Option<NaiveDate> {
        self.start().map(|s| s.with_timezone(&tz).date_naive())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassifiedEvents {
    owned: Vec<OwnedEvent>,
    foreign: usize,
}

/// Kind of an event, or `None` when it is foreign.
pub fn kind_of(event: &BookedEvent) -> Option<ActivityKind> {
    event
        .marker
        .as_deref()
        .and_then(ActivityKind::from_marker)
        .or_else(|| ActivityKind::from_label(&event.summary))
}

pub fn classify(events: &[BookedEvent]) -> ClassifiedEvents {
    let mut classified = ClassifiedEvents::default();
    for event in events {
        match kind_of(event) {
            Some(kind) => {
                let interval = match (event.start_time, event.end_time) {
                    (Some(start), Some(end)) => TimeInterval::new(start, end).ok(),
                    _ => None,
                };
                classified.owned.push(OwnedEvent {
                    event_id: event.event_id.clone(),
                    kind,
                    summary: event.summary.clone(),
                    interval,
                });
            }
            None => classified.foreign += 1,
        }
    }
    classified
}

impl ClassifiedEvents {
    pub fn owned(&self) -> &[OwnedEvent] {
        &self.owned
    }

    pub fn has_owned(&self) -> bool {
        !self.owned.is_empty()
    }

    pub fn foreign_count(&self) -> usize {
        self.foreign
    }

    pub fn of_kind(&self, kind: ActivityKind) -> impl Iterator<Item = &OwnedEvent> + '_ {
        self.owned.iter().filter(move |e| e.kind == kind)
    }

    /// Timed owned events of `kind` starting on `day` in `tz`, earliest first.
    pub fn on_day(&self, kind: ActivityKind, day: NaiveDate, tz: Tz) -> Vec<&OwnedEvent> {
        let mut events: Vec<&OwnedEvent> = self
            .of_kind(kind)
            .filter(|e| e.local_date(tz) == Some(day))
            .collect();
        events.sort_by_key(|e| e.start());
        events
    }

    pub fn count(&self, kind: ActivityKind, day: NaiveDate, tz: Tz) -> usize {
        self.on_day(kind, day, tz).len()
    }

    /// Intervals occupied on `day` by owned events of every kind.
    pub fn occupied(&self, day: NaiveDate, tz: Tz) -> Vec<TimeInterval> {
        self.owned
            .iter()
            .filter(|e| e.local_date(tz) == Some(day))
            .filter_map(|e| e.interval)
            .collect()
    }

    pub fn counts_by_kind(&self) -> PerKind<usize> {
        let mut counts = PerKind::default();
        for event in &self.owned {
            *counts.get_mut(event.kind) += 1;
        }
        counts
    }

    /// Forgets events that were deleted during the run.
    pub fn forget(&mut self, deleted: &HashSet<String>) {
        self.owned.retain(|e| !deleted.contains(&e.event_id));
    }
}

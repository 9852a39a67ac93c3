//! Scheduling-run report: pure aggregation of what a run did.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::plan::ActivityKind;

/// One value per activity kind, serialized with the plural names the HTTP
/// clients expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PerKind<T> {
    #[serde(rename = "workouts")]
    pub workout: T,
    #[serde(rename = "stretching")]
    pub stretch: T,
    pub meditation: T,
}

impl<T> PerKind<T> {
    pub fn get(&self, kind: ActivityKind) -> &T {
        match kind {
            ActivityKind::Workout => &self.workout,
            ActivityKind::Stretch => &self.stretch,
            ActivityKind::Meditation => &self.meditation,
        }
    }

    pub fn get_mut(&mut self, kind: ActivityKind) -> &mut T {
        match kind {
            ActivityKind::Workout => &mut self.workout,
            ActivityKind::Stretch => &mut self.stretch,
            ActivityKind::Meditation => &mut self.meditation,
        }
    }
}

impl PerKind<usize> {
    pub fn total(&self) -> usize {
        self.workout + self.stretch + self.meditation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    Scheduled,
    NoAvailableTime,
}

/// Per-kind annotation for one walked day, e.g. `Monday` or
/// `Monday (no available time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DayNote {
    pub date: NaiveDate,
    pub outcome: DayOutcome,
    pub label: String,
}

impl DayNote {
    pub fn new(date: NaiveDate, outcome: DayOutcome) -> Self {
        let day_name = date.format("%A");
        let label = match outcome {
            DayOutcome::Scheduled => day_name.to_string(),
            DayOutcome::NoAvailableTime => format!("{} (no available time)", day_name),
        };
        Self {
            date,
            outcome,
            label,
        }
    }
}

impl fmt::Display for DayNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KindOutcome {
    pub scheduled: usize,
    pub failed: usize,
    pub days: Vec<DayNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScheduledEventSummary {
    pub event_id: Option<String>,
    pub kind: ActivityKind,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub html_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Delete,
}

/// A write that failed for a non-auth reason. The run continued past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OperationFailure {
    pub kind: ActivityKind,
    pub operation: Operation,
    pub date: Option<NaiveDate>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RunReport {
    pub added: PerKind<usize>,
    pub removed: PerKind<usize>,
    pub kept: PerKind<usize>,
    pub outcomes: PerKind<KindOutcome>,
    pub scheduled_events: Vec<ScheduledEventSummary>,
    pub failures: Vec<OperationFailure>,
    /// False when a deadline cut the run short.
    pub complete: bool,
}

impl RunReport {
    /// Short summary, e.g. "Removed 1 events. Added 3 new events."
    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if self.removed.total() > 0 {
            parts.push(format!("Removed {} events.", self.removed.total()));
        }
        if self.added.total() > 0 {
            parts.push(format!("Added {} new events.", self.added.total()));
        }
        if self.kept.total() > 0 {
            parts.push(format!("Kept {} existing events.", self.kept.total()));
        }
        if !self.complete {
            parts.push("Stopped early; run again to finish.".to_string());
        }
        if parts.is_empty() {
            "Nothing to change.".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// What the plain scheduler returns: either a run, or a refusal because owned
/// events already exist in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RunReport),
    AlreadyScheduled { existing: usize, message: String },
}

/// Accumulates one run's results; consumed by [`ReportBuilder::finish`].
#[derive(Debug, Default)]
pub(crate) struct ReportBuilder {
    report: RunReport,
}

impl ReportBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn kept(&mut self, kind: ActivityKind, count: usize) {
        *self.report.kept.get_mut(kind) += count;
    }

    pub(crate) fn removed(&mut self, kind: ActivityKind) {
        *self.report.removed.get_mut(kind) += 1;
    }

    pub(crate) fn added(&mut self, event: ScheduledEventSummary) {
        let kind = event.kind;
        *self.report.added.get_mut(kind) += 1;
        self.report.outcomes.get_mut(kind).scheduled += 1;
        self.report.scheduled_events.push(event);
    }

    /// Records a day annotation for a kind. Called for the first occurrence
    /// attempted on a day only.
    pub(crate) fn day_note(&mut self, kind: ActivityKind, date: NaiveDate, outcome: DayOutcome) {
        self.report
            .outcomes
            .get_mut(kind)
            .days
            .push(DayNote::new(date, outcome));
    }

    pub(crate) fn no_slot(&mut self, kind: ActivityKind) {
        self.report.outcomes.get_mut(kind).failed += 1;
    }

    pub(crate) fn create_failed(&mut self, kind: ActivityKind, date: NaiveDate, message: String) {
        self.report.outcomes.get_mut(kind).failed += 1;
        self.report.failures.push(OperationFailure {
            kind,
            operation: Operation::Create,
            date: Some(date),
            message,
        });
    }

    pub(crate) fn delete_failed(
        &mut self,
        kind: ActivityKind,
        date: Option<NaiveDate>,
        message: String,
    ) {
        self.report.failures.push(OperationFailure {
            kind,
            operation: Operation::Delete,
            date,
            message,
        });
    }

    pub(crate) fn finish(self, complete: bool) -> RunReport {
        let mut report = self.report;
        report.complete = complete;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_note_labels() {
        let monday = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        assert_eq!(DayNote::new(monday, DayOutcome::Scheduled).to_string(), "Monday");
        assert_eq!(
            DayNote::new(monday, DayOutcome::NoAvailableTime).to_string(),
            "Monday (no available time)"
        );
    }

    #[test]
    fn test_message_lists_non_zero_totals() {
        let mut builder = ReportBuilder::new();
        builder.removed(ActivityKind::Stretch);
        builder.kept(ActivityKind::Workout, 2);
        let report = builder.finish(true);
        assert_eq!(report.message(), "Removed 1 events. Kept 2 existing events.");

        let report = ReportBuilder::new().finish(true);
        assert_eq!(report.message(), "Nothing to change.");
    }

    #[test]
    fn test_per_kind_serializes_with_plural_names() {
        let counts = PerKind {
            workout: 1usize,
            stretch: 2,
            meditation: 3,
        };
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["workouts"], 1);
        assert_eq!(json["stretching"], 2);
        assert_eq!(json["meditation"], 3);
        assert_eq!(counts.total(), 6);
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::ClassifiedEvents;
use crate::horizon::{business_days_in_month, StatsPeriod};
use crate::plan::{ActivityKind, ActivityPlan};
use crate::report::PerKind;

/// Month-level view for the dashboard: what is on the calendar against what
/// the plan expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScheduleOverview {
    pub has_scheduled_events: bool,
    pub counts: PerKind<usize>,
    pub expected: PerKind<usize>,
    pub total: usize,
    pub business_days_in_month: usize,
}

pub fn build_overview(
    classified: &ClassifiedEvents,
    plan: &ActivityPlan,
    today: NaiveDate,
) -> ScheduleOverview {
    let business_days = business_days_in_month(today);
    let mut expected = PerKind::default();
    for kind in ActivityKind::ALL {
        *expected.get_mut(kind) = business_days * plan.get(kind).required() as usize;
    }
    let counts = classified.counts_by_kind();

    ScheduleOverview {
        has_scheduled_events: classified.has_owned(),
        total: counts.total(),
        counts,
        expected,
        business_days_in_month: business_days,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KindStats {
    pub scheduled: usize,
    pub completed: usize,
    pub upcoming: usize,
}

impl KindStats {
    fn record(&mut self, completed: bool) {
        self.scheduled += 1;
        if completed {
            self.completed += 1;
        } else {
            self.upcoming += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatsEvent {
    pub event_id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WellnessStats {
    pub period: StatsPeriod,
    pub totals: KindStats,
    pub by_kind: PerKind<KindStats>,
    /// Completed share of scheduled events, in whole percent.
    pub completion_rate: u32,
    pub events: Vec<StatsEvent>,
}

/// An event counts as completed once its end lies before `now`. All-day
/// entries have no end and stay upcoming.
pub fn build_wellness_stats(
    period: StatsPeriod,
    classified: &ClassifiedEvents,
    now: DateTime<Utc>,
) -> WellnessStats {
    let mut totals = KindStats::default();
    let mut by_kind: PerKind<KindStats> = PerKind::default();
    let mut events = Vec::with_capacity(classified.owned().len());

    for event in classified.owned() {
        let completed = event.interval.is_some_and(|i| i.end() < now);
        totals.record(completed);
        by_kind.get_mut(event.kind).record(completed);
        events.push(StatsEvent {
            event_id: event.event_id.clone(),
            kind: event.kind,
            title: event.summary.clone(),
            start: event.interval.map(|i| i.start()),
            end: event.interval.map(|i| i.end()),
            completed,
        });
    }
    events.sort_by_key(|e| e.start);

    let completion_rate = if totals.scheduled == 0 {
        0
    } else {
        ((totals.completed as f64 / totals.scheduled as f64) * 100.0).round() as u32
    };

    WellnessStats {
        period,
        totals,
        by_kind,
        completion_rate,
        events,
    }
}

/// Result of a bulk removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RemovalReport {
    pub removed_count: usize,
    pub removed: PerKind<usize>,
    pub errors: Vec<String>,
}

impl RemovalReport {
    pub fn message(&self) -> String {
        format!("Removed {} scheduled wellness activities", self.removed_count)
    }
}

//! The reconciling auto-scheduler.
//!
//! A run reads the calendar, classifies what is there, removes what the plan
//! no longer wants, reads free/busy again and then walks the business days in
//! order, placing missing occurrences with the interval-probe slot finder:
//!
//! ```text
//! ClassifyExisting -> RemoveDisabledKinds -> RefreshBusyTimes -> WalkDays -> Report
//! ```
//!
//! Calls to the backend are strictly sequential. Every successful write is
//! final; non-auth write failures are recorded and the walk continues.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use fitgap_common::error::BackendFailure;
use fitgap_common::services::{CalendarEvent, CalendarService, ReminderPolicy};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::busy::{normalize, TimeInterval};
use crate::classify::{classify, ClassifiedEvents, OwnedEvent};
use crate::error::SchedulerError;
use crate::horizon::Horizon;
use crate::plan::{ActivityKind, ActivityPlan};
use crate::report::{DayOutcome, ReportBuilder, RunOutcome, RunReport, ScheduledEventSummary};
use crate::slots::interval_probe;
use crate::window::DailyWindow;

/// Inputs of one scheduling run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub plan: ActivityPlan,
    pub window: DailyWindow,
    pub horizon: Horizon,
    /// Run start. Nothing is placed at or before it.
    pub now: DateTime<Utc>,
    /// Checked before every backend call; once passed the run returns what it
    /// has with `complete = false`.
    pub deadline: Option<Instant>,
    pub reminder: ReminderPolicy,
}

impl RunRequest {
    pub fn new(plan: ActivityPlan, window: DailyWindow, horizon: Horizon, now: DateTime<Utc>) -> Self {
        Self {
            plan,
            window,
            horizon,
            now,
            deadline: None,
            reminder: ReminderPolicy::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_reminder(mut self, reminder: ReminderPolicy) -> Self {
        self.reminder = reminder;
        self
    }

    fn time_zone(&self) -> Tz {
        self.window.time_zone()
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Scheduling engine bound to one calendar of one backend.
pub struct Scheduler<S: CalendarService> {
    pub(crate) service: Arc<S>,
    pub(crate) calendar_id: String,
}

impl<S: CalendarService> Scheduler<S> {
    pub fn new(service: Arc<S>, calendar_id: impl Into<String>) -> Self {
        Self {
            service,
            calendar_id: calendar_id.into(),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// Moves the calendar toward `request.plan`: keeps correctly placed
    /// occurrences, removes disabled kinds and surplus, adds what is missing.
    pub async fn reconcile(&self, request: &RunRequest) -> Result<RunReport, SchedulerError> {
        request.plan.validate()?;
        let tz = request.time_zone();
        let mut report = ReportBuilder::new();

        if request.expired() {
            return Ok(report.finish(false));
        }
        let (list_start, list_end) = request.horizon.listed_range(request.now, tz);
        let mut classified = self.read_events(list_start, list_end).await?;
        info!(
            calendar_id = %self.calendar_id,
            owned = classified.owned().len(),
            foreign = classified.foreign_count(),
            "Classified existing events"
        );

        let doomed = removal_candidates(&classified, request);
        let mut deleted = HashSet::new();
        for event in doomed {
            if request.expired() {
                return Ok(report.finish(false));
            }
            match self.service.delete_event(&self.calendar_id, &event.event_id).await {
                Ok(()) => {
                    info!("Removed {} event {} ({})", event.kind, event.event_id, event.summary);
                    report.removed(event.kind);
                    deleted.insert(event.event_id.clone());
                }
                Err(err) if err.failure_kind().is_auth() => {
                    return Err(SchedulerError::from_backend("delete event", &err));
                }
                Err(err) => {
                    warn!("Failed to remove {} event {}: {}", event.kind, event.event_id, err);
                    report.delete_failed(event.kind, event.local_date(tz), err.to_string());
                }
            }
        }
        classified.forget(&deleted);

        self.walk(request, &classified, report).await
    }

    /// Plain scheduling for callers that do not reconcile. Refuses to touch a
    /// range that already holds owned events.
    pub async fn schedule_fresh(&self, request: &RunRequest) -> Result<RunOutcome, SchedulerError> {
        request.plan.validate()?;
        let tz = request.time_zone();

        if request.expired() {
            return Ok(RunOutcome::Completed(ReportBuilder::new().finish(false)));
        }
        let (list_start, list_end) = request.horizon.listed_range(request.now, tz);
        let classified = self.read_events(list_start, list_end).await?;

        if classified.has_owned() {
            let existing = classified.owned().len();
            warn!(
                calendar_id = %self.calendar_id,
                existing, "Refusing plain scheduling, owned events already in range"
            );
            return Ok(RunOutcome::AlreadyScheduled {
                existing,
                message: format!(
                    "Found {} wellness activities already scheduled. Remove them first before scheduling again.",
                    existing
                ),
            });
        }

        self.walk(request, &classified, ReportBuilder::new())
            .await
            .map(RunOutcome::Completed)
    }

    /// Reads busy time over the walked range, then fills each business day.
    async fn walk(
        &self,
        request: &RunRequest,
        classified: &ClassifiedEvents,
        mut report: ReportBuilder,
    ) -> Result<RunReport, SchedulerError> {
        let tz = request.time_zone();

        if request.expired() {
            return Ok(report.finish(false));
        }
        let (walk_start, walk_end) = request.horizon.walk_range(request.now, tz);
        let busy = self.read_busy(walk_start, walk_end).await?;

        for day in request.horizon.walk_days(request.now, tz) {
            match self.place_day(request, classified, &busy, day, &mut report).await? {
                ControlFlow::Continue(()) => {}
                ControlFlow::Break(()) => return Ok(report.finish(false)),
            }
        }

        let report = report.finish(true);
        info!(
            calendar_id = %self.calendar_id,
            added = report.added.total(),
            removed = report.removed.total(),
            kept = report.kept.total(),
            failures = report.failures.len(),
            "Scheduling run finished"
        );
        Ok(report)
    }

    /// Per-kind reconciliation of one business day. `Break` means the deadline
    /// passed.
    async fn place_day(
        &self,
        request: &RunRequest,
        classified: &ClassifiedEvents,
        busy: &[TimeInterval],
        day: NaiveDate,
        report: &mut ReportBuilder,
    ) -> Result<ControlFlow<()>, SchedulerError> {
        let tz = request.time_zone();
        let bounds = request.window.bounds_for(day);

        let mut busy_today: Vec<TimeInterval> = match bounds {
            Some(bounds) => busy.iter().filter(|b| b.overlaps(&bounds)).copied().collect(),
            None => Vec::new(),
        };
        busy_today.extend(classified.occupied(day, tz));

        for kind in request.plan.enabled_kinds() {
            let wanted = request.plan.get(kind).occurrences_per_day as usize;
            let existing = classified.count(kind, day, tz);
            report.kept(kind, existing.min(wanted));

            if existing >= wanted {
                debug!("Keeping {} existing {} events on {}", existing, kind, day);
                continue;
            }

            // The day note records the first attempt only.
            for attempt in 0..wanted - existing {
                let slot = bounds
                    .as_ref()
                    .and_then(|b| interval_probe(b, kind.duration(), &busy_today, request.now));

                let Some(slot) = slot else {
                    info!("No available time for {} #{} on {}", kind, attempt + 1, day);
                    report.no_slot(kind);
                    if attempt == 0 {
                        report.day_note(kind, day, DayOutcome::NoAvailableTime);
                    }
                    continue;
                };

                if request.expired() {
                    return Ok(ControlFlow::Break(()));
                }
                // Taken even if the create fails, so the same slot is not retried.
                busy_today.push(slot);

                let event = new_event(kind, &slot, request);
                match self.service.create_event(&self.calendar_id, event).await {
                    Ok(created) => {
                        info!("Scheduled {} on {} at {}", kind, day, slot.start());
                        report.added(ScheduledEventSummary {
                            event_id: created.event_id,
                            kind,
                            title: kind.label().to_string(),
                            start: slot.start(),
                            end: slot.end(),
                            html_link: created.html_link,
                        });
                        if attempt == 0 {
                            report.day_note(kind, day, DayOutcome::Scheduled);
                        }
                    }
                    Err(err) if err.failure_kind().is_auth() => {
                        return Err(SchedulerError::from_backend("create event", &err));
                    }
                    Err(err) => {
                        warn!("Failed to schedule {} on {}: {}", kind, day, err);
                        report.create_failed(kind, day, err.to_string());
                    }
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    pub(crate) async fn read_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ClassifiedEvents, SchedulerError> {
        let events = self
            .service
            .list_events(&self.calendar_id, start, end)
            .await
            .map_err(|e| SchedulerError::from_backend("list events", &e))?;
        debug!("Listed {} events between {} and {}", events.len(), start, end);
        Ok(classify(&events))
    }

    pub(crate) async fn read_busy(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeInterval>, SchedulerError> {
        let raw = self
            .service
            .get_busy_times(&self.calendar_id, start, end)
            .await
            .map_err(|e| SchedulerError::from_backend("free/busy query", &e))?;
        Ok(normalize(&raw))
    }
}

/// Every owned event of a disabled kind in the listed range, plus the
/// latest-starting extras on walked days where an enabled kind exceeds its
/// quota.
fn removal_candidates(classified: &ClassifiedEvents, request: &RunRequest) -> Vec<OwnedEvent> {
    let tz = request.time_zone();
    let mut doomed: Vec<OwnedEvent> = request
        .plan
        .disabled_kinds()
        .flat_map(|kind| classified.of_kind(kind).cloned())
        .collect();

    let days = request.horizon.walk_days(request.now, tz);
    for kind in request.plan.enabled_kinds() {
        let wanted = request.plan.get(kind).occurrences_per_day as usize;
        for day in &days {
            let on_day = classified.on_day(kind, *day, tz);
            if on_day.len() > wanted {
                doomed.extend(on_day[wanted..].iter().map(|e| (*e).clone()));
            }
        }
    }
    doomed
}

fn new_event(kind: ActivityKind, slot: &TimeInterval, request: &RunRequest) -> CalendarEvent {
    CalendarEvent {
        start_time: slot.start(),
        end_time: slot.end(),
        summary: kind.label().to_string(),
        description: Some(kind.description().to_string()),
        time_zone: Some(request.time_zone().name().to_string()),
        reminder: request.reminder,
        marker: Some(kind.marker().to_string()),
    }
}

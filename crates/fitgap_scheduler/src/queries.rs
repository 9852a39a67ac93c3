//! Read-mostly operations around the reconciler: ownership checks, the
//! dashboard overview, statistics, bulk removal and free-slot listing.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use fitgap_common::error::BackendFailure;
use fitgap_common::services::CalendarService;
use tracing::{info, warn};

use crate::busy::TimeInterval;
use crate::error::SchedulerError;
use crate::horizon::{Horizon, StatsPeriod};
use crate::plan::ActivityPlan;
use crate::reconcile::Scheduler;
use crate::slots::find_free_slots;
use crate::stats::{build_overview, build_wellness_stats, RemovalReport, ScheduleOverview, WellnessStats};
use crate::window::DailyWindow;

impl<S: CalendarService> Scheduler<S> {
    /// Whether any owned event exists in the horizon's listed range.
    pub async fn has_owned_events(
        &self,
        horizon: Horizon,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<bool, SchedulerError> {
        let (start, end) = horizon.listed_range(now, tz);
        Ok(self.read_events(start, end).await?.has_owned())
    }

    /// Owned counts for the current month against the plan's expectation.
    pub async fn overview(
        &self,
        plan: &ActivityPlan,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<ScheduleOverview, SchedulerError> {
        let (start, end) = Horizon::Month.listed_range(now, tz);
        let classified = self.read_events(start, end).await?;
        Ok(build_overview(&classified, plan, now.with_timezone(&tz).date_naive()))
    }

    pub async fn wellness_stats(
        &self,
        period: StatsPeriod,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<WellnessStats, SchedulerError> {
        let (start, end) = period.range(now, tz);
        let classified = self.read_events(start, end).await?;
        Ok(build_wellness_stats(period, &classified, now))
    }

    /// Deletes every owned event in the horizon's listed range, whatever its
    /// kind. Foreign events are left alone.
    pub async fn remove_all(
        &self,
        horizon: Horizon,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<RemovalReport, SchedulerError> {
        let (start, end) = horizon.listed_range(now, tz);
        let classified = self.read_events(start, end).await?;
        let mut report = RemovalReport::default();

        for event in classified.owned() {
            match self.service.delete_event(&self.calendar_id, &event.event_id).await {
                Ok(()) => {
                    report.removed_count += 1;
                    *report.removed.get_mut(event.kind) += 1;
                }
                Err(err) if err.failure_kind().is_auth() => {
                    return Err(SchedulerError::from_backend("delete event", &err));
                }
                Err(err) => {
                    warn!("Failed to remove event {}: {}", event.event_id, err);
                    report
                        .errors
                        .push(format!("Failed to remove {}: {}", event.summary, err));
                }
            }
        }

        info!(
            calendar_id = %self.calendar_id,
            removed = report.removed_count,
            errors = report.errors.len(),
            "Bulk removal finished"
        );
        Ok(report)
    }

    /// Next free slots of `duration` on the horizon's business days.
    pub async fn free_slots(
        &self,
        horizon: Horizon,
        window: &DailyWindow,
        duration: Duration,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<TimeInterval>, SchedulerError> {
        let tz = window.time_zone();
        let (start, end) = horizon.walk_range(now, tz);
        let busy = self.read_busy(start, end).await?;
        let days = horizon.walk_days(now, tz);
        Ok(find_free_slots(&days, window, duration, &busy, now, limit))
    }
}

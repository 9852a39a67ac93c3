#[cfg(test)]
mod tests {
    use crate::error::SchedulerError;
    use crate::horizon::Horizon;
    use crate::plan::{ActivityKind, ActivityPlan};
    use crate::reconcile::{RunRequest, Scheduler};
    use crate::report::{DayOutcome, RunOutcome};
    use crate::window::DailyWindow;
    use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
    use fitgap_common::error::FailureKind;
    use fitgap_common::services::mock::MockCalendarService;
    use std::sync::Arc;
    use std::time::Instant;

    const CAL: &str = "primary";

    // Monday 2025-05-05, before the window opens
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, 5, 0, 0).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, hour, minute, 0).unwrap()
    }

    fn only(kinds: &[ActivityKind]) -> ActivityPlan {
        ActivityKind::ALL
            .into_iter()
            .fold(ActivityPlan::default(), |plan, kind| {
                plan.with_enabled(kind, kinds.contains(&kind))
            })
    }

    fn request(plan: ActivityPlan) -> RunRequest {
        let window = DailyWindow::parse("06:00", "22:00", "UTC").unwrap();
        RunRequest::new(plan, window, Horizon::Week, now())
    }

    fn setup() -> (Arc<MockCalendarService>, Scheduler<MockCalendarService>) {
        let service = Arc::new(MockCalendarService::new());
        let scheduler = Scheduler::new(service.clone(), CAL);
        (service, scheduler)
    }

    #[tokio::test]
    async fn test_disabled_kind_is_removed_and_freed_time_reused() {
        let (service, scheduler) = setup();
        // Occupies the first workout candidate on Monday
        service.insert_event(CAL, "Stretching Break", at(5, 6, 0), at(5, 6, 15));

        let report = scheduler
            .reconcile(&request(only(&[ActivityKind::Workout])))
            .await
            .unwrap();

        assert_eq!(report.removed.stretch, 1);
        assert_eq!(report.added.workout, 5);
        assert_eq!(report.added.stretch, 0);
        assert!(report.complete);

        let monday = &report.scheduled_events[0];
        assert_eq!(monday.kind, ActivityKind::Workout);
        assert_eq!(monday.start, at(5, 6, 0));
    }

    #[tokio::test]
    async fn test_existing_occurrence_is_kept_without_writes() {
        let (service, scheduler) = setup();
        service.insert_event(CAL, "Workout Session", at(6, 10, 0), at(6, 10, 30));

        let report = scheduler
            .reconcile(&request(only(&[ActivityKind::Workout])))
            .await
            .unwrap();

        assert_eq!(report.kept.workout, 1);
        assert_eq!(report.added.workout, 4);
        assert_eq!(service.create_calls(), 4);
        assert!(report
            .scheduled_events
            .iter()
            .all(|e| e.start.day() != 6));
    }

    #[tokio::test]
    async fn test_second_run_converges() {
        let (service, scheduler) = setup();
        let request = request(ActivityPlan::default());

        let first = scheduler.reconcile(&request).await.unwrap();
        assert_eq!(first.added.total(), 5 * 5);

        let creates = service.create_calls();
        let second = scheduler.reconcile(&request).await.unwrap();
        assert_eq!(second.added.total(), 0);
        assert_eq!(second.removed.total(), 0);
        assert_eq!(second.kept.total(), 5 * 5);
        assert_eq!(service.create_calls(), creates);
        assert_eq!(service.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_surplus_latest_extras_are_removed() {
        let (service, scheduler) = setup();
        for hour in [8, 12, 16] {
            service.insert_event(CAL, "Stretching Break", at(5, hour, 0), at(5, hour, 15));
        }

        let report = scheduler
            .reconcile(&request(only(&[ActivityKind::Stretch])))
            .await
            .unwrap();

        assert_eq!(report.removed.stretch, 1);
        assert_eq!(report.kept.stretch, 2);
        let monday: Vec<_> = service
            .events(CAL)
            .into_iter()
            .filter(|e| e.start_time.map(|s| s.day()) == Some(5))
            .collect();
        assert_eq!(monday.len(), 2);
        assert!(monday.iter().all(|e| e.start_time != Some(at(5, 16, 0))));
    }

    #[tokio::test]
    async fn test_foreign_events_survive_disabling_everything() {
        let (service, scheduler) = setup();
        service.insert_event(CAL, "Dentist", at(5, 9, 0), at(5, 10, 0));
        service.insert_event(CAL, "Workout Session", at(5, 11, 0), at(5, 11, 30));

        let report = scheduler.reconcile(&request(only(&[]))).await.unwrap();

        assert_eq!(report.removed.workout, 1);
        let remaining = service.events(CAL);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].summary, "Dentist");
    }

    #[tokio::test]
    async fn test_plain_scheduler_refuses_when_owned_events_exist() {
        let (service, scheduler) = setup();
        for day in [5, 6, 7] {
            service.insert_event(CAL, "Meditation Break", at(day, 9, 0), at(day, 9, 5));
        }

        let outcome = scheduler
            .schedule_fresh(&request(ActivityPlan::default()))
            .await
            .unwrap();

        match outcome {
            RunOutcome::AlreadyScheduled { existing, message } => {
                assert_eq!(existing, 3);
                assert!(message.contains("Remove them first"));
            }
            other => panic!("expected refusal, got {:?}", other),
        }
        assert_eq!(service.create_calls(), 0);
        assert_eq!(service.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_plain_scheduler_walks_like_reconciler_on_empty_range() {
        let (_service, scheduler) = setup();
        let outcome = scheduler
            .schedule_fresh(&request(only(&[ActivityKind::Meditation])))
            .await
            .unwrap();

        let RunOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(report.added.meditation, 10);
        assert_eq!(report.outcomes.meditation.days.len(), 5);
        assert_eq!(report.outcomes.meditation.days[0].label, "Monday");
    }

    #[tokio::test]
    async fn test_access_denied_aborts_before_any_write() {
        let (service, scheduler) = setup();
        service.fail_all(FailureKind::AccessDenied);

        let err = scheduler
            .reconcile(&request(ActivityPlan::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, SchedulerError::AccessDenied(_)));
        assert_eq!(service.create_calls(), 0);
        assert_eq!(service.busy_calls(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_create_aborts_the_run() {
        let (service, scheduler) = setup();
        service.fail_next_create(FailureKind::Unauthenticated);

        let err = scheduler
            .reconcile(&request(ActivityPlan::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, SchedulerError::Unauthenticated(_)));
        assert_eq!(service.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_create_failure_is_recorded_and_walk_continues() {
        let (service, scheduler) = setup();
        service.fail_next_create(FailureKind::Transient);

        let report = scheduler
            .reconcile(&request(only(&[ActivityKind::Workout])))
            .await
            .unwrap();

        assert_eq!(report.added.workout, 4);
        assert_eq!(report.outcomes.workout.failed, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.complete);
        assert_eq!(service.events(CAL).len(), 4);
    }

    #[tokio::test]
    async fn test_day_note_follows_first_attempt_only() {
        let (service, scheduler) = setup();
        // Monday's first stretching create fails, its second one succeeds
        service.fail_next_create(FailureKind::Transient);

        let report = scheduler
            .reconcile(&request(only(&[ActivityKind::Stretch])))
            .await
            .unwrap();

        assert_eq!(report.added.stretch, 9);
        assert_eq!(report.outcomes.stretch.failed, 1);
        assert!(report
            .scheduled_events
            .iter()
            .any(|e| e.start.date_naive() == now().date_naive()));

        let days = &report.outcomes.stretch.days;
        assert_eq!(days.len(), 4);
        assert!(days.iter().all(|d| d.date != now().date_naive()));
        assert_eq!(days[0].label, "Tuesday");
        assert!(days.iter().all(|d| d.outcome == DayOutcome::Scheduled));
    }

    #[tokio::test]
    async fn test_read_failure_aborts_with_backend_error() {
        let (service, scheduler) = setup();
        service.fail_all(FailureKind::Transient);

        let err = scheduler
            .reconcile(&request(ActivityPlan::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_passed_deadline_returns_incomplete_report() {
        let (service, scheduler) = setup();
        let request = request(ActivityPlan::default()).with_deadline(Instant::now());

        let report = scheduler.reconcile(&request).await.unwrap();

        assert!(!report.complete);
        assert_eq!(report.added.total(), 0);
        assert_eq!(service.list_calls(), 0);
        assert!(report.message().contains("Stopped early"));
    }

    #[tokio::test]
    async fn test_full_day_reports_no_available_time() {
        let (service, scheduler) = setup();
        service.insert_event(CAL, "Offsite", at(5, 6, 0), at(5, 21, 45));

        let report = scheduler
            .reconcile(&request(only(&[ActivityKind::Workout])))
            .await
            .unwrap();

        let monday = &report.outcomes.workout.days[0];
        assert_eq!(monday.outcome, DayOutcome::NoAvailableTime);
        assert_eq!(monday.label, "Monday (no available time)");
        assert_eq!(report.outcomes.workout.failed, 1);
        assert_eq!(report.added.workout, 4);
    }

    #[tokio::test]
    async fn test_weekend_start_places_nothing_on_weekend() {
        let (service, scheduler) = setup();
        let saturday = Utc.with_ymd_and_hms(2025, 5, 3, 8, 0, 0).unwrap();
        let window = DailyWindow::parse("06:00", "22:00", "UTC").unwrap();
        let request = RunRequest::new(ActivityPlan::default(), window, Horizon::Week, saturday);

        let report = scheduler.reconcile(&request).await.unwrap();

        assert_eq!(report.added.total(), 25);
        for event in service.events(CAL) {
            let weekday = event.start_time.unwrap().weekday();
            assert!(weekday != Weekday::Sat && weekday != Weekday::Sun);
        }
    }

    #[tokio::test]
    async fn test_created_events_carry_marker_and_reminder() {
        let (service, scheduler) = setup();
        scheduler
            .reconcile(&request(only(&[ActivityKind::Stretch])))
            .await
            .unwrap();

        let events = service.events(CAL);
        assert_eq!(events.len(), 10);
        assert!(events.iter().all(|e| e.marker.as_deref() == Some("stretch")));
        assert!(events
            .iter()
            .all(|e| e.end_time.unwrap() - e.start_time.unwrap() == Duration::minutes(15)));
    }

    #[tokio::test]
    async fn test_invalid_plan_is_rejected_before_io() {
        let (service, scheduler) = setup();
        let mut plan = ActivityPlan::default();
        plan.workout.occurrences_per_day = 0;

        let err = scheduler.reconcile(&request(plan)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidPlan(_)));
        assert_eq!(service.list_calls(), 0);
    }
}

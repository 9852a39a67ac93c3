
use chrono::{Datelike, Weekday};
use fitgap_common::services::BookedEvent;
use fitgap_scheduler::classify::kind_of;
use fitgap_scheduler::{ActivityKind, ActivityPlan, RunOutcome};
use fixtures::*;
use std::collections::BTreeMap;

fn owned(events: &[BookedEvent]) -> Vec<(ActivityKind, BookedEvent)> {
    events
        .iter()
        .filter_map(|e| kind_of(e).map(|k| (k, e.clone())))
        .collect()
}

#[tokio::test]
async fn test_month_run_honours_calendar_invariants() {
    let (service, scheduler) = scheduler();
    let now = local(2025, 5, 19, 8, 0);
    seed_busy_week(&service, date(2025, 5, 19));

    let report = scheduler
        .reconcile(&month_request(ActivityPlan::default(), now))
        .await
        .unwrap();
    assert!(report.complete);
    // 10 business days left in May, 5 occurrences each
    assert_eq!(report.added.total(), 50);

    let events = service.events(CALENDAR_ID);
    let owned = owned(&events);
    assert_eq!(owned.len(), 50);

    let window = zurich_window();
    let mut per_day: BTreeMap<_, Vec<&BookedEvent>> = BTreeMap::new();
    for (_, event) in &owned {
        let start = event.start_time.unwrap();
        let end = event.end_time.unwrap();

        // future-only
        assert!(start > now, "{} starts before the run", event.summary);

        // window containment
        let day = window.local_date(start);
        let bounds = window.bounds_for(day).unwrap();
        assert!(bounds.start() <= start && end <= bounds.end());

        // weekend exclusion
        assert!(!matches!(day.weekday(), Weekday::Sat | Weekday::Sun));

        per_day.entry(day).or_default().push(event);
    }

    // no-overlap, including against the seeded meetings
    for (day, day_events) in &per_day {
        let all_today: Vec<_> = events
            .iter()
            .filter(|e| window.local_date(e.start_time.unwrap()) == *day)
            .collect();
        for (i, a) in all_today.iter().enumerate() {
            for b in &all_today[i + 1..] {
                let overlap = a.start_time < b.end_time && b.start_time < a.end_time;
                assert!(!overlap, "{} overlaps {} on {}", a.summary, b.summary, day);
            }
        }
        assert_eq!(day_events.len(), 5, "quota on {}", day);
    }
}

#[tokio::test]
async fn test_first_slots_fill_gaps_around_meetings() {
    let (service, scheduler) = scheduler();
    let now = local(2025, 5, 19, 8, 0);
    seed_busy_week(&service, date(2025, 5, 19));

    let report = scheduler
        .reconcile(&month_request(ActivityPlan::default(), now))
        .await
        .unwrap();

    let monday: Vec<_> = report
        .scheduled_events
        .iter()
        .filter(|e| e.start.with_timezone(&ZONE).day() == 19)
        .map(|e| (e.kind, e.start))
        .collect();
    assert_eq!(
        monday,
        vec![
            (ActivityKind::Workout, local(2025, 5, 19, 8, 15)),
            (ActivityKind::Stretch, local(2025, 5, 19, 8, 45)),
            (ActivityKind::Stretch, local(2025, 5, 19, 12, 0)),
            (ActivityKind::Meditation, local(2025, 5, 19, 12, 15)),
            (ActivityKind::Meditation, local(2025, 5, 19, 12, 30)),
        ]
    );
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let (service, scheduler) = scheduler();
    let now = local(2025, 5, 26, 6, 30);
    seed_busy_week(&service, date(2025, 5, 26));
    let request = month_request(ActivityPlan::default(), now);

    let first = scheduler.reconcile(&request).await.unwrap();
    let second = scheduler.reconcile(&request).await.unwrap();

    assert_eq!(first.added.total(), 25);
    assert_eq!(second.added.total(), 0);
    assert_eq!(second.removed.total(), 0);
    assert_eq!(second.kept.total(), first.added.total());
    assert_eq!(second.message(), "Kept 25 existing events.");
}

#[tokio::test]
async fn test_disabling_a_kind_clears_it_across_the_month() {
    let (service, scheduler) = scheduler();
    // Earlier in the month, outside the walked days
    service.insert_event(
        CALENDAR_ID,
        "Stretching Break",
        local(2025, 5, 6, 10, 0),
        local(2025, 5, 6, 10, 15),
    );
    let now = local(2025, 5, 26, 6, 30);
    scheduler
        .reconcile(&month_request(ActivityPlan::default(), now))
        .await
        .unwrap();

    let before = owned(&service.events(CALENDAR_ID));
    let stretches = before
        .iter()
        .filter(|(k, _)| *k == ActivityKind::Stretch)
        .count();
    assert_eq!(stretches, 11);

    let plan = ActivityPlan::default().with_enabled(ActivityKind::Stretch, false);
    let report = scheduler.reconcile(&month_request(plan, now)).await.unwrap();

    assert_eq!(report.removed.stretch, 11);
    assert_eq!(report.removed.workout, 0);
    assert_eq!(report.removed.meditation, 0);
    assert_eq!(report.added.total(), 0);

    let after = owned(&service.events(CALENDAR_ID));
    assert!(after.iter().all(|(k, _)| *k != ActivityKind::Stretch));
    assert_eq!(after.len(), before.len() - 11);
}

#[tokio::test]
async fn test_label_only_events_are_recognised() {
    let (service, scheduler) = scheduler();
    let now = local(2025, 5, 26, 6, 30);
    let request = month_request(plan_with(&[ActivityKind::Workout]), now);

    // Created by hand, without the private marker
    service.insert_event(
        CALENDAR_ID,
        "Workout Session (gym)",
        local(2025, 5, 27, 7, 0),
        local(2025, 5, 27, 7, 30),
    );
    let report = scheduler.reconcile(&request).await.unwrap();

    assert_eq!(report.kept.workout, 1);
    assert_eq!(report.added.workout, 4);
    assert_eq!(service.events(CALENDAR_ID).len(), 5);
}

#[tokio::test]
async fn test_plain_scheduler_then_reconciler() {
    let (service, scheduler) = scheduler();
    let now = local(2025, 5, 26, 6, 30);
    let request = month_request(plan_with(&[ActivityKind::Meditation]), now);

    let outcome = scheduler.schedule_fresh(&request).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(ref r) if r.added.meditation == 10));

    let creates = service.create_calls();
    let outcome = scheduler.schedule_fresh(&request).await.unwrap();
    assert!(matches!(outcome, RunOutcome::AlreadyScheduled { existing: 10, .. }));
    assert_eq!(service.create_calls(), creates);

    let report = scheduler.reconcile(&request).await.unwrap();
    assert_eq!(report.kept.meditation, 10);
}

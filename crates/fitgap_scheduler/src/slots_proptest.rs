#[cfg(test)]
mod tests {
    use crate::busy::{normalize, TimeInterval};
    use crate::slots::{gap_sweep, interval_probe};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn day_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> DateTime<Utc> {
        day_start() + Duration::minutes(m)
    }

    // Busy periods as (start minute, length) pairs within one day
    fn busy_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
        prop::collection::vec((0..1440i64, 0..240i64), 0..12)
    }

    fn to_busy(raw: &[(i64, i64)]) -> Vec<TimeInterval> {
        let pairs: Vec<_> = raw
            .iter()
            .map(|&(start, len)| (minutes(start), minutes(start + len)))
            .collect();
        normalize(&pairs)
    }

    // Earliest minute-aligned start at or after `from` that fits, by brute force
    fn brute_force_earliest(
        window: &TimeInterval,
        duration: Duration,
        busy: &[TimeInterval],
        from: DateTime<Utc>,
    ) -> Option<TimeInterval> {
        let mut start = from;
        while start + duration <= window.end() {
            let candidate = TimeInterval::new(start, start + duration).unwrap();
            if !busy.iter().any(|b| candidate.overlaps(b)) {
                return Some(candidate);
            }
            start += Duration::minutes(1);
        }
        None
    }

    proptest! {
        #[test]
        fn test_gap_sweep_slots_are_valid(
            raw_busy in busy_strategy(),
            window_start in 0..720i64,
            window_len in 1..720i64,
            duration_minutes in 1..90i64,
            now_minute in -60..1440i64,
        ) {
            let window = TimeInterval::new(minutes(window_start), minutes(window_start + window_len)).unwrap();
            let busy = to_busy(&raw_busy);
            let duration = Duration::minutes(duration_minutes);
            let now = minutes(now_minute);

            let slots = gap_sweep(&window, duration, &busy, now);

            for (i, slot) in slots.iter().enumerate() {
                prop_assert!(window.contains(slot), "slot {:?} outside window {:?}", slot, window);
                prop_assert!(slot.start() > now);
                prop_assert_eq!(slot.duration(), duration);
                for b in &busy {
                    prop_assert!(!slot.overlaps(b), "slot {:?} overlaps busy {:?}", slot, b);
                }
                for other in &slots[i + 1..] {
                    prop_assert!(!slot.overlaps(other));
                    prop_assert!(slot.start() < other.start());
                }
            }
        }

        #[test]
        fn test_gap_sweep_finds_the_earliest_slot(
            raw_busy in busy_strategy(),
            window_start in 0..720i64,
            window_len in 1..720i64,
            duration_minutes in 1..90i64,
        ) {
            let window = TimeInterval::new(minutes(window_start), minutes(window_start + window_len)).unwrap();
            let busy = to_busy(&raw_busy);
            let duration = Duration::minutes(duration_minutes);
            let long_ago = day_start() - Duration::days(1);

            let swept = gap_sweep(&window, duration, &busy, long_ago).into_iter().next();
            let expected = brute_force_earliest(&window, duration, &busy, window.start());
            prop_assert_eq!(swept, expected);
        }

        #[test]
        fn test_interval_probe_slot_is_valid(
            raw_busy in busy_strategy(),
            window_start in 0..720i64,
            window_len in 1..720i64,
            duration_minutes in 1..90i64,
            now_minute in -60..1440i64,
        ) {
            let window = TimeInterval::new(minutes(window_start), minutes(window_start + window_len)).unwrap();
            let busy = to_busy(&raw_busy);
            let duration = Duration::minutes(duration_minutes);
            let now = minutes(now_minute);

            if let Some(slot) = interval_probe(&window, duration, &busy, now) {
                prop_assert!(window.contains(&slot));
                prop_assert!(slot.start() > now);
                prop_assert_eq!((slot.start() - window.start()).num_minutes() % 15, 0);
                for b in &busy {
                    prop_assert!(!slot.overlaps(b));
                }
            }
        }

        #[test]
        fn test_repeated_probing_never_overlaps(
            raw_busy in busy_strategy(),
            durations in prop::collection::vec(prop::sample::select(vec![5i64, 15, 30]), 1..8),
        ) {
            let window = TimeInterval::new(minutes(360), minutes(1320)).unwrap();
            let mut busy = to_busy(&raw_busy);
            let long_ago = day_start() - Duration::days(1);
            let mut placed: Vec<TimeInterval> = Vec::new();

            for length in durations {
                if let Some(slot) = interval_probe(&window, Duration::minutes(length), &busy, long_ago) {
                    busy.push(slot);
                    placed.push(slot);
                }
            }

            for (i, a) in placed.iter().enumerate() {
                for b in &placed[i + 1..] {
                    prop_assert!(!(a.start() < b.end() && b.start() < a.end()));
                }
            }
        }
    }
}

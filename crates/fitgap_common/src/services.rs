//! Calendar backend abstraction.
//!
//! The scheduler talks to the user's calendar only through [`CalendarService`],
//! so the engine can run against Google Calendar in production and against the
//! in-memory [`mock::MockCalendarService`] in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::error::BackendFailure;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Private extended-property key used to tag events created by FitGap.
pub const MARKER_KEY: &str = "fitgap_kind";

/// A trait for the four calendar operations the scheduler consumes.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + BackendFailure + Send + Sync + 'static;

    /// Get busy time intervals within a specified time range, sorted by start.
    #[allow(clippy::type_complexity)]
    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error>;

    /// List the (non-cancelled) events overlapping a time range.
    fn list_events(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error>;

    /// Create a calendar event.
    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error>;

    /// Delete a calendar event. Deleting an event that no longer exists succeeds.
    fn delete_event(&self, calendar_id: &str, event_id: &str) -> BoxFuture<'_, (), Self::Error>;
}

/// How the calendar should remind the user of a created event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderPolicy {
    /// Leave reminders to the calendar's defaults.
    ProviderDefault,
    /// A single popup the given number of minutes before the start.
    Popup { minutes_before: u32 },
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        ReminderPolicy::Popup { minutes_before: 5 }
    }
}

/// An event to be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// The start time of the event.
    pub start_time: DateTime<Utc>,
    /// The end time of the event.
    pub end_time: DateTime<Utc>,
    /// The summary or title of the event.
    pub summary: String,
    /// An optional description of the event.
    pub description: Option<String>,
    /// IANA time zone the event should be displayed in.
    pub time_zone: Option<String>,
    pub reminder: ReminderPolicy,
    /// Value stored under [`MARKER_KEY`] when the backend supports private properties.
    pub marker: Option<String>,
}

/// Represents the result of a calendar event operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventResult {
    /// The ID of the event.
    pub event_id: Option<String>,
    /// Link to the event in the provider's UI.
    pub html_link: Option<String>,
    /// The status of the event.
    pub status: String,
}

/// An event read back from the calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedEvent {
    /// The ID of the event.
    pub event_id: String,
    /// The summary or title of the event.
    pub summary: String,
    /// An optional description of the event.
    pub description: Option<String>,
    /// Start instant; `None` for all-day entries.
    pub start_time: Option<DateTime<Utc>>,
    /// End instant; `None` for all-day entries.
    pub end_time: Option<DateTime<Utc>>,
    /// The status of the event.
    pub status: String,
    /// Value of the [`MARKER_KEY`] private property, if present.
    pub marker: Option<String>,
}

/// In-memory implementation of CalendarService for tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::error::FailureKind;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum MockCalendarError {
        #[error("Injected backend failure: {0:?}")]
        Injected(FailureKind),
        #[error("Event overlaps an existing busy period")]
        Conflict,
        #[error("End time must be after start time")]
        InvalidTimes,
    }

    impl BackendFailure for MockCalendarError {
        fn failure_kind(&self) -> FailureKind {
            match self {
                MockCalendarError::Injected(kind) => *kind,
                _ => FailureKind::Other,
            }
        }
    }

    #[derive(Debug, Clone)]
    struct StoredEvent {
        id: String,
        summary: String,
        description: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        marker: Option<String>,
    }

    impl StoredEvent {
        fn to_booked(&self) -> BookedEvent {
            BookedEvent {
                event_id: self.id.clone(),
                summary: self.summary.clone(),
                description: self.description.clone(),
                start_time: Some(self.start),
                end_time: Some(self.end),
                status: "confirmed".to_string(),
                marker: self.marker.clone(),
            }
        }
    }

    /// Mock calendar service for testing.
    ///
    /// Every stored event is also a busy period, the way a real free/busy query
    /// reports the user's own events.
    #[derive(Default)]
    pub struct MockCalendarService {
        events: Mutex<HashMap<String, Vec<StoredEvent>>>,
        fail_all: Mutex<Option<FailureKind>>,
        create_failures: Mutex<VecDeque<FailureKind>>,
        delete_failures: Mutex<VecDeque<FailureKind>>,
        busy_calls: AtomicUsize,
        list_calls: AtomicUsize,
        create_calls: AtomicUsize,
        delete_calls: AtomicUsize,
    }

    impl MockCalendarService {
        /// Create a new mock calendar service.
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed an event directly, bypassing conflict checks. Returns its id.
        pub fn insert_event(
            &self,
            calendar_id: &str,
            summary: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> String {
            let id = format!("seed-{}", uuid::Uuid::new_v4());
            let mut events = self.events.lock().expect("mock calendar lock poisoned");
            events
                .entry(calendar_id.to_string())
                .or_default()
                .push(StoredEvent {
                    id: id.clone(),
                    summary: summary.to_string(),
                    description: None,
                    start,
                    end,
                    marker: None,
                });
            id
        }

        /// Snapshot of every event stored for a calendar, sorted by start.
        pub fn events(&self, calendar_id: &str) -> Vec<BookedEvent> {
            let events = self.events.lock().expect("mock calendar lock poisoned");
            let mut booked: Vec<BookedEvent> = events
                .get(calendar_id)
                .map(|list| list.iter().map(StoredEvent::to_booked).collect())
                .unwrap_or_default();
            booked.sort_by_key(|e| e.start_time);
            booked
        }

        /// Make every subsequent call fail with `kind`.
        pub fn fail_all(&self, kind: FailureKind) {
            *self.fail_all.lock().expect("mock calendar lock poisoned") = Some(kind);
        }

        /// Make the next create call fail with `kind`.
        pub fn fail_next_create(&self, kind: FailureKind) {
            self.create_failures
                .lock()
                .expect("mock calendar lock poisoned")
                .push_back(kind);
        }

        /// Make the next delete call fail with `kind`.
        pub fn fail_next_delete(&self, kind: FailureKind) {
            self.delete_failures
                .lock()
                .expect("mock calendar lock poisoned")
                .push_back(kind);
        }

        pub fn busy_calls(&self) -> usize {
            self.busy_calls.load(Ordering::SeqCst)
        }

        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        pub fn delete_calls(&self) -> usize {
            self.delete_calls.load(Ordering::SeqCst)
        }

        fn check_fail_all(&self) -> Result<(), MockCalendarError> {
            match *self.fail_all.lock().expect("mock calendar lock poisoned") {
                Some(kind) => Err(MockCalendarError::Injected(kind)),
                None => Ok(()),
            }
        }

        fn overlapping(
            &self,
            calendar_id: &str,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
        ) -> Vec<StoredEvent> {
            let events = self.events.lock().expect("mock calendar lock poisoned");
            let mut found: Vec<StoredEvent> = events
                .get(calendar_id)
                .map(|list| {
                    list.iter()
                        .filter(|e| e.start < end_time && e.end > start_time)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            found.sort_by_key(|e| e.start);
            found
        }
    }

    impl CalendarService for MockCalendarService {
        type Error = MockCalendarError;

        fn get_busy_times(
            &self,
            calendar_id: &str,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
        ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                self.busy_calls.fetch_add(1, Ordering::SeqCst);
                self.check_fail_all()?;
                Ok(self
                    .overlapping(&calendar_id, start_time, end_time)
                    .into_iter()
                    .map(|e| (e.start, e.end))
                    .collect())
            })
        }

        fn list_events(
            &self,
            calendar_id: &str,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
        ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                self.list_calls.fetch_add(1, Ordering::SeqCst);
                self.check_fail_all()?;
                Ok(self
                    .overlapping(&calendar_id, start_time, end_time)
                    .iter()
                    .map(StoredEvent::to_booked)
                    .collect())
            })
        }

        fn create_event(
            &self,
            calendar_id: &str,
            event: CalendarEvent,
        ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                self.create_calls.fetch_add(1, Ordering::SeqCst);
                self.check_fail_all()?;
                if let Some(kind) = self
                    .create_failures
                    .lock()
                    .expect("mock calendar lock poisoned")
                    .pop_front()
                {
                    return Err(MockCalendarError::Injected(kind));
                }

                if event.end_time <= event.start_time {
                    return Err(MockCalendarError::InvalidTimes);
                }
                if !self
                    .overlapping(&calendar_id, event.start_time, event.end_time)
                    .is_empty()
                {
                    return Err(MockCalendarError::Conflict);
                }

                let event_id = format!("mock-event-{}", uuid::Uuid::new_v4());
                let mut events = self.events.lock().expect("mock calendar lock poisoned");
                events.entry(calendar_id).or_default().push(StoredEvent {
                    id: event_id.clone(),
                    summary: event.summary,
                    description: event.description,
                    start: event.start_time,
                    end: event.end_time,
                    marker: event.marker,
                });

                Ok(CalendarEventResult {
                    html_link: Some(format!("https://calendar.example/{}", event_id)),
                    event_id: Some(event_id),
                    status: "confirmed".to_string(),
                })
            })
        }

        fn delete_event(
            &self,
            calendar_id: &str,
            event_id: &str,
        ) -> BoxFuture<'_, (), Self::Error> {
            let calendar_id = calendar_id.to_string();
            let event_id = event_id.to_string();

            Box::pin(async move {
                self.delete_calls.fetch_add(1, Ordering::SeqCst);
                self.check_fail_all()?;
                if let Some(kind) = self
                    .delete_failures
                    .lock()
                    .expect("mock calendar lock poisoned")
                    .pop_front()
                {
                    return Err(MockCalendarError::Injected(kind));
                }

                let mut events = self.events.lock().expect("mock calendar lock poisoned");
                if let Some(calendar_events) = events.get_mut(&calendar_id) {
                    calendar_events.retain(|e| e.id != event_id);
                }
                Ok(())
            })
        }
    }
}

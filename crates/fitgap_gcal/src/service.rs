// --- File: crates/fitgap_gcal/src/service.rs ---
//! Google Calendar implementation of [`CalendarService`].
//!
//! Events created here carry their activity kind in a private extended
//! property under [`MARKER_KEY`], and their reminder as an explicit popup
//! override unless the provider default is requested.

use chrono::{DateTime, Utc};
use fitgap_common::error::{config_error, unauthenticated, BackendFailure, FailureKind, FitgapError};
use fitgap_common::services::{
    BookedEvent, BoxFuture, CalendarEvent, CalendarEventResult, CalendarService, ReminderPolicy,
    MARKER_KEY,
};
use google_calendar3::api::{
    Event, EventDateTime, EventExtendedProperties, EventReminder, EventReminders,
    FreeBusyRequest, FreeBusyRequestItem,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{create_token_hub, Credential, HubType};
use crate::handlers::{CalendarProvider, NO_CREDENTIAL_MESSAGE};

/// Largest page Google accepts for `events.list`.
const LIST_PAGE_SIZE: i32 = 250;

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Free/busy lookup failed for calendar {calendar_id}: {reason}")]
    FreeBusy { calendar_id: String, reason: String },
}

impl GcalServiceError {
    /// HTTP status reported by Google, when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GcalServiceError::ApiError(err) => api_status(err),
            GcalServiceError::FreeBusy { .. } => None,
        }
    }
}

impl BackendFailure for GcalServiceError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            GcalServiceError::ApiError(err) => classify_api_error(err),
            GcalServiceError::FreeBusy { .. } => FailureKind::Other,
        }
    }
}

fn api_status(err: &google_calendar3::Error) -> Option<u16> {
    match err {
        google_calendar3::Error::BadRequest(body) => error_code(body),
        google_calendar3::Error::Failure(response) => Some(response.status().as_u16()),
        _ => None,
    }
}

fn error_code(body: &Value) -> Option<u16> {
    body.pointer("/error/code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
}

pub(crate) fn classify_api_error(err: &google_calendar3::Error) -> FailureKind {
    match err {
        google_calendar3::Error::MissingToken(_) => FailureKind::Unauthenticated,
        google_calendar3::Error::BadRequest(body) => classify_error_body(body),
        google_calendar3::Error::Failure(response) => {
            FailureKind::from_status(response.status().as_u16())
        }
        google_calendar3::Error::HttpError(_) | google_calendar3::Error::Io(_) => {
            FailureKind::Transient
        }
        _ => FailureKind::Other,
    }
}

/// Google reports quota exhaustion as 403 with a rate-limit reason; that is
/// retryable and must not be mistaken for a revoked scope.
pub(crate) fn classify_error_body(body: &Value) -> FailureKind {
    let rate_limited = body
        .pointer("/error/errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors.iter().any(|e| {
                matches!(
                    e.get("reason").and_then(Value::as_str),
                    Some("rateLimitExceeded" | "userRateLimitExceeded")
                )
            })
        })
        .unwrap_or(false);

    match error_code(body) {
        Some(403 | 429) if rate_limited => FailureKind::Transient,
        Some(code) => FailureKind::from_status(code),
        None => FailureKind::Other,
    }
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarService {
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }
}

pub(crate) fn to_google_event(event: CalendarEvent) -> Event {
    let time_zone = event.time_zone.clone().or_else(|| Some("UTC".to_string()));

    let reminders = match event.reminder {
        ReminderPolicy::ProviderDefault => EventReminders {
            use_default: Some(true),
            overrides: None,
        },
        ReminderPolicy::Popup { minutes_before } => EventReminders {
            use_default: Some(false),
            overrides: Some(vec![EventReminder {
                method: Some("popup".to_string()),
                minutes: Some(i32::try_from(minutes_before).unwrap_or(i32::MAX)),
            }]),
        },
    };

    let extended_properties = event.marker.map(|marker| EventExtendedProperties {
        private: Some(HashMap::from([(MARKER_KEY.to_string(), marker)])),
        shared: None,
    });

    Event {
        summary: Some(event.summary),
        description: event.description,
        start: Some(EventDateTime {
            date_time: Some(event.start_time),
            time_zone: time_zone.clone(),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: Some(event.end_time),
            time_zone,
            ..Default::default()
        }),
        reminders: Some(reminders),
        extended_properties,
        ..Default::default()
    }
}

/// Converts a listed event. All-day entries keep `None` times.
pub(crate) fn from_google_event(event: Event) -> BookedEvent {
    let marker = event
        .extended_properties
        .and_then(|props| props.private)
        .and_then(|mut private| private.remove(MARKER_KEY));

    BookedEvent {
        event_id: event.id.unwrap_or_default(),
        summary: event.summary.unwrap_or_default(),
        description: event.description,
        start_time: event.start.and_then(|start| start.date_time),
        end_time: event.end.and_then(|end| end.date_time),
        status: event.status.unwrap_or_else(|| "confirmed".to_string()),
        marker,
    }
}

impl CalendarService for GoogleCalendarService {
    type Error = GcalServiceError;

    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let req = FreeBusyRequest {
                time_min: Some(start_time),
                time_max: Some(end_time),
                time_zone: Some("UTC".to_string()),
                items: Some(vec![FreeBusyRequestItem {
                    id: Some(calendar_id.clone()),
                }]),
                ..Default::default()
            };

            let (_response, freebusy_response) = calendar_hub.freebusy().query(req).doit().await?;

            let calendars = freebusy_response.calendars.unwrap_or_default();
            let Some(cal_info) = calendars.get(&calendar_id) else {
                return Err(GcalServiceError::FreeBusy {
                    calendar_id,
                    reason: "calendar missing from response".to_string(),
                });
            };
            if let Some(reason) = cal_info
                .errors
                .as_ref()
                .and_then(|errors| errors.first())
                .and_then(|e| e.reason.clone())
            {
                return Err(GcalServiceError::FreeBusy {
                    calendar_id,
                    reason,
                });
            }

            let mut busy_periods: Vec<_> = cal_info
                .busy
                .iter()
                .flatten()
                .filter_map(|period| match (period.start, period.end) {
                    (Some(start), Some(end)) => Some((start, end)),
                    _ => {
                        warn!("Skipping busy period with missing start/end: {:?}", period);
                        None
                    }
                })
                .collect();
            busy_periods.sort_by_key(|k| k.0);

            debug!(
                calendar_id = %calendar_id,
                busy = busy_periods.len(),
                "Fetched free/busy"
            );
            Ok(busy_periods)
        })
    }

    /// Lists non-cancelled events, following `nextPageToken` until the range
    /// is read completely.
    fn list_events(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let mut booked_events = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut request = calendar_hub
                    .events()
                    .list(&calendar_id)
                    .time_min(start_time)
                    .time_max(end_time)
                    .single_events(true)
                    .order_by("startTime")
                    .max_results(LIST_PAGE_SIZE);
                if let Some(token) = page_token.as_deref() {
                    request = request.page_token(token);
                }

                let (_, events_list) = request.doit().await?;

                booked_events.extend(
                    events_list
                        .items
                        .into_iter()
                        .flatten()
                        .filter(|event| event.status.as_deref() != Some("cancelled"))
                        .map(from_google_event),
                );

                match events_list.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }

            debug!(
                calendar_id = %calendar_id,
                events = booked_events.len(),
                "Listed events"
            );
            Ok(booked_events)
        })
    }

    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let summary = event.summary.clone();
            let new_event = to_google_event(event);

            let (_response, created_event) = calendar_hub
                .events()
                .insert(new_event, &calendar_id)
                .doit()
                .await?;

            info!(
                calendar_id = %calendar_id,
                event_id = ?created_event.id,
                "Created event '{}'",
                summary
            );
            Ok(CalendarEventResult {
                event_id: created_event.id,
                html_link: created_event.html_link,
                status: created_event
                    .status
                    .unwrap_or_else(|| "confirmed".to_string()),
            })
        })
    }

    /// Deletes an event. 404 and 410 mean it is already gone and count as
    /// success.
    fn delete_event(&self, calendar_id: &str, event_id: &str) -> BoxFuture<'_, (), Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            match calendar_hub
                .events()
                .delete(&calendar_id, &event_id)
                .send_updates("none")
                .doit()
                .await
            {
                Ok(_) => {
                    info!(calendar_id = %calendar_id, event_id = %event_id, "Deleted event");
                    Ok(())
                }
                Err(err) if matches!(api_status(&err), Some(404 | 410)) => {
                    debug!(event_id = %event_id, "Event already gone");
                    Ok(())
                }
                Err(err) => Err(GcalServiceError::ApiError(err)),
            }
        })
    }
}

/// Production provider: a hub per bearer token, else the shared service
/// account hub when one is configured.
pub struct GoogleProvider {
    service_account: Option<Arc<GoogleCalendarService>>,
}

impl GoogleProvider {
    pub fn new(service_account: Option<Arc<GoogleCalendarService>>) -> Self {
        Self { service_account }
    }
}

impl CalendarProvider for GoogleProvider {
    type Service = GoogleCalendarService;

    fn connect(&self, credential: Credential<'_>) -> Result<Arc<Self::Service>, FitgapError> {
        match credential {
            Credential::Bearer(token) => {
                let hub = create_token_hub(token).map_err(config_error)?;
                Ok(Arc::new(GoogleCalendarService::new(Arc::new(hub))))
            }
            Credential::ServiceAccount => self
                .service_account
                .clone()
                .ok_or_else(|| unauthenticated(NO_CREDENTIAL_MESSAGE)),
        }
    }
}

// File: crates/fitgap_gcal/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::{
    ActivityPreferences, HorizonQuery, RemovalResponse, ScheduleRequest, ScheduleResponse,
    SlotsQuery, SlotsResponse, StatsQuery, UserPreferences,
};
use fitgap_scheduler::{RemovalReport, RunReport, ScheduleOverview, TimeInterval, WellnessStats};

#[utoipa::path(
    post,
    path = "/calendar/smart-schedule",
    request_body(content = ScheduleRequest, example = json!({
        "activityPreferences": { "workouts": true, "stretching": false, "meditation": true },
        "userPreferences": {
            "earliestWorkoutTime": "07:00",
            "latestWorkoutTime": "19:00",
            "timezone": "Europe/Zurich"
        }
    })),
    responses(
        (status = 200, description = "Calendar reconciled with the plan", body = ScheduleResponse,
         example = json!({
             "success": true,
             "message": "Removed 10 events. Added 5 new events. Kept 15 existing events."
         })
        ),
        (status = 401, description = "No usable calendar credential"),
        (status = 403, description = "Calendar access denied"),
        (status = 502, description = "Calendar read failed")
    )
)]
fn doc_smart_schedule_handler() {}

#[utoipa::path(
    post,
    path = "/calendar/auto-schedule",
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Activities scheduled", body = ScheduleResponse),
        (status = 409, description = "Activities already scheduled in the range", body = ScheduleResponse,
         example = json!({
             "success": false,
             "message": "Found 12 wellness activities already scheduled. Remove them first before scheduling again.",
             "existing": 12
         })
        ),
        (status = 401, description = "No usable calendar credential"),
        (status = 403, description = "Calendar access denied")
    )
)]
fn doc_auto_schedule_handler() {}

#[utoipa::path(
    get,
    path = "/calendar/check-scheduled",
    responses(
        (status = 200, description = "Owned events this month against the plan", body = ScheduleOverview),
        (status = 401, description = "No usable calendar credential")
    )
)]
fn doc_check_scheduled_handler() {}

#[utoipa::path(
    post,
    path = "/calendar/remove-scheduled",
    params(HorizonQuery),
    responses(
        (status = 200, description = "Owned events removed", body = RemovalResponse),
        (status = 401, description = "No usable calendar credential"),
        (status = 403, description = "Calendar access denied")
    )
)]
fn doc_remove_scheduled_handler() {}

#[utoipa::path(
    get,
    path = "/calendar/wellness-stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Completion statistics for the period", body = WellnessStats),
        (status = 400, description = "Unknown period")
    )
)]
fn doc_wellness_stats_handler() {}

#[utoipa::path(
    get,
    path = "/calendar/slots",
    params(SlotsQuery),
    responses(
        (status = 200, description = "Next free slots on business days", body = SlotsResponse),
        (status = 400, description = "duration_minutes must be positive")
    )
)]
fn doc_free_slots_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_smart_schedule_handler,
        doc_auto_schedule_handler,
        doc_check_scheduled_handler,
        doc_remove_scheduled_handler,
        doc_wellness_stats_handler,
        doc_free_slots_handler
    ),
    components(
        schemas(
            ScheduleRequest,
            ActivityPreferences,
            UserPreferences,
            ScheduleResponse,
            RunReport,
            RemovalResponse,
            RemovalReport,
            ScheduleOverview,
            WellnessStats,
            SlotsResponse,
            TimeInterval
        )
    ),
    tags(
        (name = "calendar", description = "Wellness scheduling on Google Calendar")
    ),
    servers(
        (url = "/api", description = "FitGap API server")
    )
)]
pub struct GcalApiDoc;

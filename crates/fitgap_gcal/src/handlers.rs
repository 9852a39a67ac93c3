// File: crates/fitgap_gcal/src/handlers.rs
use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
};
use chrono::{Duration, Utc};
use fitgap_common::error::{unauthenticated, validation_error, FitgapError};
use fitgap_common::services::{CalendarService, ReminderPolicy};
use fitgap_config::AppConfig;
use fitgap_scheduler::{
    ActivityKind, ActivityPlan, DailyWindow, Horizon, RemovalReport, RunOutcome, RunReport,
    RunRequest, ScheduleOverview, Scheduler, StatsPeriod, TimeInterval, WellnessStats,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::{parse_bearer, Credential};

pub const NO_CREDENTIAL_MESSAGE: &str =
    "No calendar credential. Sign in with Google or configure a service account.";

/// Resolves a calendar backend for the credential presented with a request.
pub trait CalendarProvider: Send + Sync + 'static {
    type Service: CalendarService + 'static;

    fn connect(&self, credential: Credential<'_>) -> Result<Arc<Self::Service>, FitgapError>;
}

pub struct GcalState<P> {
    pub config: Arc<AppConfig>,
    pub provider: P,
}

impl<P: CalendarProvider> GcalState<P> {
    pub fn new(config: Arc<AppConfig>, provider: P) -> Self {
        Self { config, provider }
    }

    fn calendar_id(&self) -> String {
        self.config
            .gcal
            .as_ref()
            .and_then(|gcal| gcal.calendar_id.clone())
            .unwrap_or_else(|| "primary".to_string())
    }

    /// Bearer token first, then the service account; neither is a 401 before
    /// any backend call.
    fn scheduler(&self, headers: &HeaderMap) -> Result<Scheduler<P::Service>, FitgapError> {
        let credential = match headers.get(AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(parse_bearer)
                .map(Credential::Bearer)
                .ok_or_else(|| unauthenticated("Malformed Authorization header"))?,
            None => Credential::ServiceAccount,
        };
        let service = self.provider.connect(credential)?;
        Ok(Scheduler::new(service, self.calendar_id()))
    }

    fn default_window(&self) -> Result<DailyWindow, FitgapError> {
        UserPreferences::default().window(&self.config)
    }

    fn time_zone(&self) -> Result<chrono_tz::Tz, FitgapError> {
        Ok(self.default_window()?.time_zone())
    }
}

/// Which kinds to schedule. Missing entries keep the configured value.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPreferences {
    pub workouts: Option<bool>,
    pub stretching: Option<bool>,
    pub meditation: Option<bool>,
}

impl ActivityPreferences {
    pub fn apply(&self, mut plan: ActivityPlan) -> ActivityPlan {
        for (kind, choice) in [
            (ActivityKind::Workout, self.workouts),
            (ActivityKind::Stretch, self.stretching),
            (ActivityKind::Meditation, self.meditation),
        ] {
            if let Some(enabled) = choice {
                plan = plan.with_enabled(kind, enabled);
            }
        }
        plan
    }
}

/// Daily window overrides ("HH:MM" and an IANA zone).
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub earliest_workout_time: Option<String>,
    pub latest_workout_time: Option<String>,
    pub timezone: Option<String>,
}

impl UserPreferences {
    pub fn window(&self, config: &AppConfig) -> Result<DailyWindow, FitgapError> {
        let defaults = &config.scheduler;
        let window = DailyWindow::parse(
            self.earliest_workout_time
                .as_deref()
                .unwrap_or(&defaults.earliest_time),
            self.latest_workout_time
                .as_deref()
                .unwrap_or(&defaults.latest_time),
            self.timezone.as_deref().unwrap_or(&defaults.time_zone),
        )?;
        Ok(window)
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub activity_preferences: ActivityPreferences,
    #[serde(default)]
    pub user_preferences: UserPreferences,
    /// Defaults to the configured horizon.
    #[serde(default)]
    pub horizon: Option<Horizon>,
}

impl ScheduleRequest {
    pub(crate) fn into_run_request(self, config: &AppConfig) -> Result<RunRequest, FitgapError> {
        let settings = &config.scheduler;
        let plan = self
            .activity_preferences
            .apply(ActivityPlan::from(&settings.plan));
        let window = self.user_preferences.window(config)?;
        let horizon = self.horizon.unwrap_or_else(|| settings.horizon.into());

        let reminder = match settings.reminder_minutes {
            0 => ReminderPolicy::ProviderDefault,
            minutes_before => ReminderPolicy::Popup { minutes_before },
        };
        let mut request = RunRequest::new(plan, window, horizon, Utc::now()).with_reminder(reminder);
        if let Some(seconds) = settings.deadline_seconds {
            request = request.with_deadline(Instant::now() + std::time::Duration::from_secs(seconds));
        }
        Ok(request)
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
    /// Owned events that made the plain scheduler refuse to run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<usize>,
}

impl From<RunReport> for ScheduleResponse {
    fn from(report: RunReport) -> Self {
        Self {
            success: true,
            message: report.message(),
            report: Some(report),
            existing: None,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalResponse {
    pub success: bool,
    pub message: String,
    pub report: RemovalReport,
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HorizonQuery {
    pub horizon: Option<Horizon>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StatsQuery {
    pub period: Option<StatsPeriod>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Deserialize, Serialize)]
pub struct SlotsQuery {
    pub duration_minutes: i64,
    pub limit: Option<usize>,
    pub horizon: Option<Horizon>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub slots: Vec<TimeInterval>,
}

/// Reconciling run: keeps, removes and adds until the calendar matches the plan.
pub async fn smart_schedule_handler<P: CalendarProvider>(
    State(state): State<Arc<GcalState<P>>>,
    headers: HeaderMap,
    Json(body): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>, FitgapError> {
    let scheduler = state.scheduler(&headers)?;
    let request = body.into_run_request(&state.config)?;
    info!(horizon = ?request.horizon, "Smart schedule requested");

    let report = scheduler.reconcile(&request).await?;
    Ok(Json(report.into()))
}

/// Plain run: refuses with 409 while owned events exist in the range.
pub async fn auto_schedule_handler<P: CalendarProvider>(
    State(state): State<Arc<GcalState<P>>>,
    headers: HeaderMap,
    Json(body): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), FitgapError> {
    let scheduler = state.scheduler(&headers)?;
    let request = body.into_run_request(&state.config)?;
    info!(horizon = ?request.horizon, "Auto schedule requested");

    match scheduler.schedule_fresh(&request).await? {
        RunOutcome::Completed(report) => Ok((StatusCode::OK, Json(report.into()))),
        RunOutcome::AlreadyScheduled { existing, message } => {
            warn!(existing, "Auto schedule refused");
            Ok((
                StatusCode::CONFLICT,
                Json(ScheduleResponse {
                    success: false,
                    message,
                    report: None,
                    existing: Some(existing),
                }),
            ))
        }
    }
}

pub async fn check_scheduled_handler<P: CalendarProvider>(
    State(state): State<Arc<GcalState<P>>>,
    headers: HeaderMap,
) -> Result<Json<ScheduleOverview>, FitgapError> {
    let scheduler = state.scheduler(&headers)?;
    let plan = ActivityPlan::from(&state.config.scheduler.plan);
    let overview = scheduler
        .overview(&plan, Utc::now(), state.time_zone()?)
        .await?;
    Ok(Json(overview))
}

pub async fn remove_scheduled_handler<P: CalendarProvider>(
    State(state): State<Arc<GcalState<P>>>,
    headers: HeaderMap,
    Query(query): Query<HorizonQuery>,
) -> Result<Json<RemovalResponse>, FitgapError> {
    let scheduler = state.scheduler(&headers)?;
    let horizon = query
        .horizon
        .unwrap_or_else(|| state.config.scheduler.horizon.into());

    let report = scheduler
        .remove_all(horizon, Utc::now(), state.time_zone()?)
        .await?;
    Ok(Json(RemovalResponse {
        success: report.errors.is_empty(),
        message: report.message(),
        report,
    }))
}

pub async fn wellness_stats_handler<P: CalendarProvider>(
    State(state): State<Arc<GcalState<P>>>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<Json<WellnessStats>, FitgapError> {
    let scheduler = state.scheduler(&headers)?;
    let stats = scheduler
        .wellness_stats(query.period.unwrap_or_default(), Utc::now(), state.time_zone()?)
        .await?;
    Ok(Json(stats))
}

/// No slot can outlast a single day's window.
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;

pub async fn free_slots_handler<P: CalendarProvider>(
    State(state): State<Arc<GcalState<P>>>,
    headers: HeaderMap,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, FitgapError> {
    if query.duration_minutes <= 0 {
        return Err(validation_error("duration_minutes must be positive"));
    }
    if query.duration_minutes > MAX_SLOT_MINUTES {
        return Err(validation_error(format!(
            "duration_minutes must be at most {}",
            MAX_SLOT_MINUTES
        )));
    }
    let scheduler = state.scheduler(&headers)?;
    let window = state.default_window()?;
    let horizon = query
        .horizon
        .unwrap_or_else(|| state.config.scheduler.horizon.into());

    let slots = scheduler
        .free_slots(
            horizon,
            &window,
            Duration::minutes(query.duration_minutes),
            Utc::now(),
            query.limit,
        )
        .await?;
    Ok(Json(SlotsResponse { slots }))
}

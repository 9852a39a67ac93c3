// --- File: crates/fitgap_gcal/src/routes.rs ---

use crate::auth::create_calendar_hub;
use crate::handlers::{
    auto_schedule_handler, check_scheduled_handler, free_slots_handler, remove_scheduled_handler,
    smart_schedule_handler, wellness_stats_handler, CalendarProvider, GcalState,
};
use crate::service::{GoogleCalendarService, GoogleProvider};
use axum::{
    routing::{get, post},
    Router,
};
use fitgap_config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// The `/calendar` routes over any provider.
pub fn router<P: CalendarProvider>(state: Arc<GcalState<P>>) -> Router {
    let calendar = Router::new()
        .route("/smart-schedule", post(smart_schedule_handler::<P>))
        .route("/auto-schedule", post(auto_schedule_handler::<P>))
        .route("/check-scheduled", get(check_scheduled_handler::<P>))
        .route("/remove-scheduled", post(remove_scheduled_handler::<P>))
        .route("/wellness-stats", get(wellness_stats_handler::<P>))
        .route("/slots", get(free_slots_handler::<P>))
        .with_state(state);

    Router::new().nest("/calendar", calendar)
}

/// Routes backed by Google Calendar. A service account that fails to load is
/// logged and skipped; requests then need a bearer token.
pub async fn routes(config: Arc<AppConfig>) -> Router {
    let service_account = match config.gcal.as_ref() {
        Some(gcal) if gcal.key_path.is_some() => match create_calendar_hub(gcal).await {
            Ok(hub) => {
                info!("Google Calendar service account loaded");
                Some(Arc::new(GoogleCalendarService::new(Arc::new(hub))))
            }
            Err(err) => {
                warn!("Service account unavailable, bearer tokens only: {}", err);
                None
            }
        },
        _ => None,
    };

    router(Arc::new(GcalState::new(
        config,
        GoogleProvider::new(service_account),
    )))
}

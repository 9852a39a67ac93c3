// File: services/fitgap_backend/src/main.rs
use axum::{routing::get, Router};
use fitgap_common::logging;
use fitgap_config::load_config;
#[cfg(feature = "gcal")]
use fitgap_gcal::routes as gcal_routes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let config = Arc::new(load_config()?);

    let api_router = Router::new().route("/", get(|| async { "Welcome to the FitGap API!" }));

    let api_router = Router::new().nest("/api", {
        #[allow(unused_mut)] // mutated only with the gcal feature
        let mut router = api_router;
        #[cfg(feature = "gcal")]
        {
            if config.use_gcal {
                router = router.merge(gcal_routes::routes(config.clone()).await);
            } else {
                info!("Google Calendar disabled by configuration");
            }
        }
        router
    });

    #[allow(unused_mut)]
    let mut app = api_router;

    #[cfg(feature = "openapi")]
    {
        #[cfg(feature = "gcal")]
        use fitgap_gcal::doc::GcalApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "FitGap API",
                version = "0.1.0",
                description = "Wellness activity scheduling on the user's calendar",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
            tags( (name = "FitGap", description = "Core service endpoints")),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        #[allow(unused_mut)]
        let mut openapi_doc = ApiDoc::openapi();
        #[cfg(feature = "gcal")]
        openapi_doc.merge(GcalApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// --- File: crates/fitgap_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{FitgapError, HttpStatusCode};

/// Extension trait for FitgapError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for FitgapError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_message = self.to_string();

        let body = Json(json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for FitgapError to make it easier to use in Axum handlers.
impl IntoResponse for FitgapError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Converts a Result<T, E> into a JSON handler result, mapping the error into a
/// FitgapError response.
pub fn handle_json_result<T, E>(result: Result<T, E>) -> Result<Json<T>, Response>
where
    T: serde::Serialize,
    E: Into<FitgapError>,
{
    result.map(Json).map_err(|err| err.into().into_response())
}

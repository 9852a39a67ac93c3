use fitgap_common::error::{BackendFailure, FailureKind, FitgapError, HttpStatusCode};
use std::fmt;
use thiserror::Error;

/// Run-level failures. Per-occurrence write failures never surface here; they
/// are folded into the [`RunReport`](crate::report::RunReport).
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Calendar credential missing or expired: {0}")]
    Unauthenticated(String),

    #[error("Calendar access denied: {0}")]
    AccessDenied(String),

    #[error("Calendar backend failed during {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid daily window: {0}")]
    InvalidWindow(String),

    #[error("Invalid time interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid activity plan: {0}")]
    InvalidPlan(String),
}

impl SchedulerError {
    /// Maps a failed read (list, free/busy) onto a run-aborting error.
    pub(crate) fn from_backend<E>(operation: &'static str, err: &E) -> Self
    where
        E: BackendFailure + fmt::Display,
    {
        match err.failure_kind() {
            FailureKind::Unauthenticated => SchedulerError::Unauthenticated(err.to_string()),
            FailureKind::AccessDenied => SchedulerError::AccessDenied(err.to_string()),
            FailureKind::Transient | FailureKind::Other => SchedulerError::Backend {
                operation,
                message: err.to_string(),
            },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            SchedulerError::Unauthenticated(_) | SchedulerError::AccessDenied(_)
        )
    }
}

impl HttpStatusCode for SchedulerError {
    fn status_code(&self) -> u16 {
        match self {
            SchedulerError::Unauthenticated(_) => 401,
            SchedulerError::AccessDenied(_) => 403,
            SchedulerError::Backend { .. } => 502,
            SchedulerError::InvalidWindow(_)
            | SchedulerError::InvalidInterval(_)
            | SchedulerError::InvalidPlan(_) => 400,
        }
    }
}

impl From<SchedulerError> for FitgapError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Unauthenticated(_) => FitgapError::Unauthenticated(
                "No valid calendar credential. Please sign in again.".to_string(),
            ),
            SchedulerError::AccessDenied(_) => FitgapError::AccessDenied(
                "Calendar access denied. Please sign in again and grant calendar permissions."
                    .to_string(),
            ),
            SchedulerError::Backend { operation, message } => FitgapError::ExternalServiceError {
                service_name: format!("calendar ({})", operation),
                message,
            },
            other => FitgapError::ValidationError(other.to_string()),
        }
    }
}

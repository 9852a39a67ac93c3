// --- File: crates/fitgap_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type surfaced to HTTP callers.
///
/// Each crate keeps its own error enum and converts into `FitgapError` at the
/// boundary where a response is built.
#[derive(Error, Debug)]
pub enum FitgapError {
    /// No usable credential was presented
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The calendar backend rejected the credential's permissions
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation of caller input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// The request conflicts with existing state (e.g. already scheduled)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for FitgapError {
    fn status_code(&self) -> u16 {
        match self {
            FitgapError::Unauthenticated(_) => 401,
            FitgapError::AccessDenied(_) => 403,
            FitgapError::ConfigError(_) => 500,
            FitgapError::ValidationError(_) => 400,
            FitgapError::ExternalServiceError { .. } => 502,
            FitgapError::ConflictError(_) => 409,
            FitgapError::InternalError(_) => 500,
        }
    }
}

/// Coarse classification of a failed calendar backend call.
///
/// The scheduler aborts a run on the auth-class kinds and folds everything
/// else into its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credential missing or expired (HTTP 401)
    Unauthenticated,
    /// Credential valid but lacking permission (HTTP 403)
    AccessDenied,
    /// Rate limiting or network trouble
    Transient,
    /// Anything else
    Other,
}

impl FailureKind {
    /// True for the kinds that must abort a scheduling run.
    pub fn is_auth(self) -> bool {
        matches!(self, FailureKind::Unauthenticated | FailureKind::AccessDenied)
    }

    /// Maps an HTTP status code returned by a calendar provider.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureKind::Unauthenticated,
            403 => FailureKind::AccessDenied,
            408 | 429 | 500..=599 => FailureKind::Transient,
            _ => FailureKind::Other,
        }
    }
}

/// Implemented by every calendar backend error type.
pub trait BackendFailure {
    fn failure_kind(&self) -> FailureKind;
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> FitgapError {
    FitgapError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> FitgapError {
    FitgapError::ValidationError(message.to_string())
}

pub fn unauthenticated<T: fmt::Display>(message: T) -> FitgapError {
    FitgapError::Unauthenticated(message.to_string())
}

pub fn access_denied<T: fmt::Display>(message: T) -> FitgapError {
    FitgapError::AccessDenied(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> FitgapError {
    FitgapError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

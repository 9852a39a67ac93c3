// --- File: crates/fitgap_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod services; // Calendar backend abstraction

// Re-export error types and utilities for easier access
pub use error::{
    access_denied, config_error, external_service_error, unauthenticated, validation_error,
    BackendFailure, FailureKind, FitgapError, HttpStatusCode,
};

// Re-export HTTP utilities for easier access
pub use http::{handle_json_result, IntoHttpResponse};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_error};

// This crate provides the functionality shared by the scheduler engine, the
// Google Calendar backend and the HTTP service.

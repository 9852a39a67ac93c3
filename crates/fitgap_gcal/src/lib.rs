// --- File: crates/fitgap_gcal/src/lib.rs ---
//! Google Calendar backend for the FitGap scheduler and the `/calendar`
//! HTTP routes that drive it.

pub mod auth;
pub mod doc;
pub mod handlers;
pub mod routes;
pub mod service;

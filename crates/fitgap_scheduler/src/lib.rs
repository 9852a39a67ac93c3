// --- File: crates/fitgap_scheduler/src/lib.rs ---
//! Free-slot discovery and the reconciling wellness auto-scheduler.
//!
//! The engine only sees the calendar through
//! [`fitgap_common::services::CalendarService`]; see [`Scheduler`].

pub mod busy;
pub mod classify;
pub mod error;
pub mod horizon;
pub mod plan;
pub mod queries;
pub mod reconcile;
#[cfg(test)]
mod reconcile_test;
pub mod report;
pub mod slots;
#[cfg(test)]
mod slots_proptest;
pub mod stats;
pub mod window;

pub use busy::TimeInterval;
pub use error::SchedulerError;
pub use horizon::{Horizon, StatsPeriod};
pub use plan::{ActivityKind, ActivityPlan, KindPlan};
pub use reconcile::{RunRequest, Scheduler};
pub use report::{PerKind, RunOutcome, RunReport};
pub use stats::{RemovalReport, ScheduleOverview, WellnessStats};
pub use window::DailyWindow;

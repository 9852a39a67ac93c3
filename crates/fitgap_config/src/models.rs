// --- File: crates/fitgap_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Google Calendar Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GcalConfig {
    /// Service account key file, used when a request carries no bearer token.
    pub key_path: Option<String>,
    /// Defaults to "primary".
    pub calendar_id: Option<String>,
}

/// One activity kind's entry in the configured plan.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KindPlanConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Falls back to the kind's built-in default when absent.
    #[serde(default)]
    pub occurrences_per_day: Option<u32>,
}

impl Default for KindPlanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            occurrences_per_day: None,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PlanConfig {
    #[serde(default)]
    pub workout: KindPlanConfig,
    #[serde(default)]
    pub stretch: KindPlanConfig,
    #[serde(default)]
    pub meditation: KindPlanConfig,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HorizonSetting {
    Week,
    #[default]
    Month,
}

// --- Scheduler Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulerConfig {
    /// "HH:MM"
    #[serde(default = "default_earliest_time")]
    pub earliest_time: String,
    /// "HH:MM"
    #[serde(default = "default_latest_time")]
    pub latest_time: String,
    /// IANA zone the daily window is expressed in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub horizon: HorizonSetting,
    #[serde(default = "default_reminder_minutes")]
    pub reminder_minutes: u32,
    /// Optional per-run deadline; unset means runs are not cut short.
    #[serde(default)]
    pub deadline_seconds: Option<u64>,
    #[serde(default)]
    pub plan: PlanConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            earliest_time: default_earliest_time(),
            latest_time: default_latest_time(),
            time_zone: default_time_zone(),
            horizon: HorizonSetting::default(),
            reminder_minutes: default_reminder_minutes(),
            deadline_seconds: None,
            plan: PlanConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_earliest_time() -> String {
    "06:00".to_string()
}

fn default_latest_time() -> String {
    "22:00".to_string()
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_reminder_minutes() -> u32 {
    5
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_gcal: bool,

    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

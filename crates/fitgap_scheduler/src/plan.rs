//! Activity kinds and the desired per-day plan.

use chrono::Duration;
use fitgap_config::{KindPlanConfig, PlanConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchedulerError;

/// Upper bound on occurrences of one kind per day.
pub const MAX_OCCURRENCES_PER_DAY: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Workout,
    Stretch,
    Meditation,
}

impl ActivityKind {
    /// Declaration order. Classification and the daily walk both follow it.
    pub const ALL: [ActivityKind; 3] = [
        ActivityKind::Workout,
        ActivityKind::Stretch,
        ActivityKind::Meditation,
    ];

    pub fn duration(self) -> Duration {
        match self {
            ActivityKind::Workout => Duration::minutes(30),
            ActivityKind::Stretch => Duration::minutes(15),
            ActivityKind::Meditation => Duration::minutes(5),
        }
    }

    /// Calendar title. Also the identity key for events without a marker.
    pub fn label(self) -> &'static str {
        match self {
            ActivityKind::Workout => "Workout Session",
            ActivityKind::Stretch => "Stretching Break",
            ActivityKind::Meditation => "Meditation Break",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ActivityKind::Workout => "Time for a quick workout to boost your energy!",
            ActivityKind::Stretch => "Take a moment to stretch and move your body.",
            ActivityKind::Meditation => "Take a moment to breathe and center yourself.",
        }
    }

    pub fn default_occurrences(self) -> u32 {
        match self {
            ActivityKind::Workout => 1,
            ActivityKind::Stretch | ActivityKind::Meditation => 2,
        }
    }

    /// Value stored in the private ownership marker.
    pub fn marker(self) -> &'static str {
        match self {
            ActivityKind::Workout => "workout",
            ActivityKind::Stretch => "stretch",
            ActivityKind::Meditation => "meditation",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.marker() == marker)
    }

    /// First kind (in declaration order) whose label the title contains.
    pub fn from_label(summary: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| summary.contains(kind.label()))
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KindPlan {
    pub enabled: bool,
    pub occurrences_per_day: u32,
}

impl KindPlan {
    pub fn default_for(kind: ActivityKind) -> Self {
        Self {
            enabled: true,
            occurrences_per_day: kind.default_occurrences(),
        }
    }

    /// Occurrences a business day should hold; zero when disabled.
    pub fn required(&self) -> u32 {
        if self.enabled {
            self.occurrences_per_day
        } else {
            0
        }
    }
}

/// The desired state: which kinds are enabled and how often per business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActivityPlan {
    pub workout: KindPlan,
    pub stretch: KindPlan,
    pub meditation: KindPlan,
}

impl Default for ActivityPlan {
    fn default() -> Self {
        Self {
            workout: KindPlan::default_for(ActivityKind::Workout),
            stretch: KindPlan::default_for(ActivityKind::Stretch),
            meditation: KindPlan::default_for(ActivityKind::Meditation),
        }
    }
}

impl ActivityPlan {
    pub fn get(&self, kind: ActivityKind) -> KindPlan {
        match kind {
            ActivityKind::Workout => self.workout,
            ActivityKind::Stretch => self.stretch,
            ActivityKind::Meditation => self.meditation,
        }
    }

    pub fn get_mut(&mut self, kind: ActivityKind) -> &mut KindPlan {
        match kind {
            ActivityKind::Workout => &mut self.workout,
            ActivityKind::Stretch => &mut self.stretch,
            ActivityKind::Meditation => &mut self.meditation,
        }
    }

    pub fn with_enabled(mut self, kind: ActivityKind, enabled: bool) -> Self {
        self.get_mut(kind).enabled = enabled;
        self
    }

    pub fn is_enabled(&self, kind: ActivityKind) -> bool {
        self.get(kind).enabled
    }

    pub fn enabled_kinds(&self) -> impl Iterator<Item = ActivityKind> + '_ {
        ActivityKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
    }

    pub fn disabled_kinds(&self) -> impl Iterator<Item = ActivityKind> + '_ {
        ActivityKind::ALL
            .into_iter()
            .filter(|kind| !self.is_enabled(*kind))
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        for kind in ActivityKind::ALL {
            let entry = self.get(kind);
            if !entry.enabled {
                continue;
            }
            if entry.occurrences_per_day == 0 {
                return Err(SchedulerError::InvalidPlan(format!(
                    "{} is enabled with zero occurrences per day; disable it instead",
                    kind
                )));
            }
            if entry.occurrences_per_day > MAX_OCCURRENCES_PER_DAY {
                return Err(SchedulerError::InvalidPlan(format!(
                    "{} occurrences of {} per day exceed the limit of {}",
                    entry.occurrences_per_day, kind, MAX_OCCURRENCES_PER_DAY
                )));
            }
        }
        Ok(())
    }
}

impl From<&PlanConfig> for ActivityPlan {
    fn from(config: &PlanConfig) -> Self {
        fn entry(kind: ActivityKind, config: &KindPlanConfig) -> KindPlan {
            KindPlan {
                enabled: config.enabled,
                occurrences_per_day: config
                    .occurrences_per_day
                    .unwrap_or_else(|| kind.default_occurrences()),
            }
        }

        Self {
            workout: entry(ActivityKind::Workout, &config.workout),
            stretch: entry(ActivityKind::Stretch, &config.stretch),
            meditation: entry(ActivityKind::Meditation, &config.meditation),
        }
    }
}

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Occurrence / event generation settings
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const MIN_HORIZON_MONTHS: u32 = 1;
pub const MAX_HORIZON_MONTHS: u32 = 24;

/// Months past the current one that events are kept materialized for.
pub const DEFAULT_HORIZON_MONTHS: u32 = 3;

/// Occurrence cap for one generation run.
pub const DEFAULT_MAX_GENERATED: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingSettings {
    /// Whole months past the end of the current month that events are kept
    /// materialized for.
    #[serde(default = "d_horizon_months")]
    pub horizon_months: u32,

    /// Cap handed to the occurrence calculator when generating events for
    /// a horizon. Must comfortably exceed the occurrences of a daily show
    /// across the horizon.
    #[serde(default = "d_max_generated")]
    pub max_generated_occurrences: usize,

    /// Number of upcoming occurrences shown by previews (`showplan next`).
    #[serde(default = "d_preview")]
    pub preview_occurrences: usize,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            horizon_months: d_horizon_months(),
            max_generated_occurrences: d_max_generated(),
            preview_occurrences: d_preview(),
        }
    }
}

impl SchedulingSettings {
    /// Smallest cap that still covers a daily show across the whole
    /// horizon, current month included.
    pub fn min_generation_cap(&self) -> usize {
        31 * (self.horizon_months as usize + 1)
    }
}

fn d_horizon_months() -> u32 {
    DEFAULT_HORIZON_MONTHS
}

fn d_max_generated() -> usize {
    DEFAULT_MAX_GENERATED
}

fn d_preview() -> usize {
    5
}

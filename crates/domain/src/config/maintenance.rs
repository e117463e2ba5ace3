use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Maintenance sweep configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Periodic horizon maintenance. The daemon ticks every `interval_secs`
/// and tops up each active show's events to the current horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "d_enabled")]
    pub enabled: bool,
    #[serde(default = "d_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: d_enabled(),
            interval_secs: d_interval_secs(),
        }
    }
}

impl MaintenanceConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs.max(1))
    }
}

fn d_enabled() -> bool {
    true
}

fn d_interval_secs() -> u64 {
    600
}

mod maintenance;
mod observability;
mod scheduling;
mod storage;

pub use maintenance::*;
pub use observability::*;
pub use scheduling::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scheduling: SchedulingSettings,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !(MIN_HORIZON_MONTHS..=MAX_HORIZON_MONTHS).contains(&self.scheduling.horizon_months) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "scheduling.horizon_months".into(),
                message: format!(
                    "must be within {MIN_HORIZON_MONTHS}..={MAX_HORIZON_MONTHS}, got {}",
                    self.scheduling.horizon_months
                ),
            });
        }

        let min_cap = self.scheduling.min_generation_cap();
        if self.scheduling.max_generated_occurrences < min_cap {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "scheduling.max_generated_occurrences".into(),
                message: format!(
                    "must be at least {min_cap} to cover a daily show over {} month(s), got {}",
                    self.scheduling.horizon_months, self.scheduling.max_generated_occurrences
                ),
            });
        }

        if self.scheduling.preview_occurrences == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "scheduling.preview_occurrences".into(),
                message: "0 disables upcoming-occurrence previews".into(),
            });
        }

        if self.maintenance.interval_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "maintenance.interval_secs".into(),
                message: "interval must be greater than 0".into(),
            });
        } else if self.maintenance.interval_secs < 60 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "maintenance.interval_secs".into(),
                message: format!(
                    "{}s is very aggressive for a horizon measured in months",
                    self.maintenance.interval_secs
                ),
            });
        }

        if self.storage.state_path.as_os_str().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.state_path".into(),
                message: "state_path must not be empty".into(),
            });
        }

        errors
    }
}
